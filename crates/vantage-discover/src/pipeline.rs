//! Scan, store, and compare against history in one step.

use vantage_core::types::ScanSnapshot;
use vantage_store::{SnapshotQuery, SnapshotStore, StoredSnapshot};

use crate::config::ScanProfile;
use crate::convert;
use crate::diff::{self, ComparisonResult};
use crate::error::Result;
use crate::scanner::NmapScanner;

/// What a single scan produced.
pub struct ScanOutcome {
    pub stored: StoredSnapshot,
    /// Changes since the previous snapshot of the same target, if any.
    pub changes: Option<ComparisonResult>,
}

/// Run nmap against `target`, persist the snapshot, and diff it against
/// the most recent earlier snapshot of the same target.
pub async fn run_single_scan(
    scanner: &NmapScanner,
    store: &dyn SnapshotStore,
    target: &str,
    profile: ScanProfile,
) -> Result<ScanOutcome> {
    let output = scanner.scan(target, profile).await?;
    let snapshot = convert::snapshot_from_output(&output);
    record_snapshot(store, snapshot)
}

/// Persist a snapshot and compare it with the latest earlier snapshot of
/// the same target.
pub fn record_snapshot(store: &dyn SnapshotStore, snapshot: ScanSnapshot) -> Result<ScanOutcome> {
    let previous = store
        .list(&SnapshotQuery {
            target: Some(snapshot.target.clone()),
            to: Some(snapshot.started_at),
            ..Default::default()
        })?
        .into_iter()
        .find(|info| info.id != snapshot.id);

    let stored = store.save(&snapshot)?;

    tracing::info!(
        snapshot_id = %snapshot.id,
        target = %snapshot.target,
        hosts = snapshot.hosts.len(),
        open_ports = snapshot.open_port_count(),
        "Snapshot recorded"
    );

    let changes = match previous {
        Some(info) => {
            let older = store.get(info.id)?;
            let result = diff::compare(&older.snapshot, &snapshot);
            tracing::info!(
                previous = %info.id,
                new_hosts = result.new_hosts.len(),
                removed_hosts = result.removed_hosts.len(),
                opened = result.new_ports.len(),
                closed = result.closed_ports.len(),
                "Compared with previous scan"
            );
            Some(result)
        }
        None => {
            tracing::info!(target = %snapshot.target, "First scan of target, nothing to compare");
            None
        }
    };

    Ok(ScanOutcome { stored, changes })
}
