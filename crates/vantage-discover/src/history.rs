//! Scan history search.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use vantage_store::{SnapshotInfo, SnapshotQuery, SnapshotStore};

use crate::error::{DiscoverError, Result};
use crate::risk::{scan_risk, ScanRisk};

/// Search criteria for the scan history. Dates are whole UTC days, both
/// ends inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub target: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_hosts: Option<usize>,
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn to_query(&self) -> Result<SnapshotQuery> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DiscoverError::InvalidFilter(format!(
                    "start date {from} is after end date {to}"
                )));
            }
        }
        Ok(SnapshotQuery {
            target: self.target.clone(),
            from: self.from.map(start_of_day),
            to: self.to.map(|d| start_of_day(d) + TimeDelta::days(1) - TimeDelta::nanoseconds(1)),
            min_hosts: self.min_hosts,
            limit: self.limit,
        })
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// One history line: the listing entry plus its risk label. `None` when
/// the snapshot could not be re-read.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub info: SnapshotInfo,
    pub risk: Option<ScanRisk>,
}

/// List snapshots matching `filter`, newest first.
pub fn search_history(store: &dyn SnapshotStore, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>> {
    let entries = store.list(&filter.to_query()?)?;
    tracing::debug!(matches = entries.len(), "History searched");

    Ok(entries
        .into_iter()
        .map(|info| {
            let risk = match store.get(info.id) {
                Ok(stored) => Some(scan_risk(&stored.snapshot)),
                Err(e) => {
                    tracing::warn!(snapshot_id = %info.id, error = %e, "Cannot rate snapshot");
                    None
                }
            };
            HistoryEntry { info, risk }
        })
        .collect())
}
