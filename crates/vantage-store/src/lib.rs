//! Vantage Store — tamper-evident scan history.
//!
//! Every finished scan is kept as a [`StoredSnapshot`]: the snapshot itself
//! plus a BLAKE3 hash of its content. Reads recompute the hash so a file
//! edited on disk is detected instead of silently feeding the analyses.

pub mod hash;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vantage_core::types::{ScanSnapshot, SnapshotId};

pub use store::{FsSnapshotStore, SnapshotQuery, SnapshotStore, StoreError};

/// A snapshot as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSnapshot {
    pub snapshot: ScanSnapshot,
    /// When the snapshot was written to the store.
    pub stored_at: DateTime<Utc>,
    /// BLAKE3 content hash (hex) of `snapshot`.
    pub content_hash: String,
}

impl StoredSnapshot {
    /// Wrap a snapshot, hashing its content.
    pub fn seal(snapshot: ScanSnapshot) -> Result<Self, serde_json::Error> {
        let content_hash = hash::compute_snapshot_hash(&snapshot)?;
        Ok(Self {
            snapshot,
            stored_at: Utc::now(),
            content_hash,
        })
    }

    /// Verify that the stored hash matches a freshly computed one.
    pub fn verify_integrity(&self) -> bool {
        hash::compute_snapshot_hash(&self.snapshot)
            .map(|h| h == self.content_hash)
            .unwrap_or(false)
    }

    pub fn id(&self) -> SnapshotId {
        self.snapshot.id
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo::from(&self.snapshot)
    }
}

/// Lightweight listing entry for scan history views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotInfo {
    pub id: SnapshotId,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub host_count: usize,
    pub open_ports: usize,
}

impl From<&ScanSnapshot> for SnapshotInfo {
    fn from(snapshot: &ScanSnapshot) -> Self {
        Self {
            id: snapshot.id,
            target: snapshot.target.clone(),
            started_at: snapshot.started_at,
            finished_at: snapshot.finished_at,
            host_count: snapshot.hosts.len(),
            open_ports: snapshot.open_port_count(),
        }
    }
}
