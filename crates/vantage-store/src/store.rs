//! Snapshot storage — trait + filesystem implementation.
//!
//! Snapshots are stored as JSON files organized by scan start date and
//! snapshot ID.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use vantage_core::types::{ScanSnapshot, SnapshotId};

use crate::{SnapshotInfo, StoredSnapshot};

/// Errors that can occur during snapshot storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Snapshot not found: {0}")]
    NotFound(SnapshotId),

    #[error("Integrity check failed for snapshot {0}: stored hash does not match content")]
    IntegrityViolation(SnapshotId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query parameters for listing snapshots.
#[derive(Debug, Default)]
pub struct SnapshotQuery {
    /// Only include snapshots with exactly this target.
    pub target: Option<String>,
    /// Only include snapshots started at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only include snapshots started at or before this time.
    pub to: Option<DateTime<Utc>>,
    /// Only include snapshots with at least this many hosts.
    pub min_hosts: Option<usize>,
    /// Maximum number of entries returned (newest first).
    pub limit: Option<usize>,
}

/// Trait for snapshot persistence backends.
pub trait SnapshotStore {
    /// Seal and store a snapshot.
    fn save(&self, snapshot: &ScanSnapshot) -> Result<StoredSnapshot, StoreError>;

    /// Retrieve a snapshot by ID, verifying integrity.
    fn get(&self, id: SnapshotId) -> Result<StoredSnapshot, StoreError>;

    /// List snapshots matching the query, ordered by started_at descending.
    fn list(&self, query: &SnapshotQuery) -> Result<Vec<SnapshotInfo>, StoreError>;

    /// Remove a snapshot.
    fn delete(&self, id: SnapshotId) -> Result<(), StoreError>;
}

/// File-system backed snapshot store.
///
/// ```text
/// {root}/
///   2026/
///     03/
///       14/
///         {snapshot_id}.json
/// ```
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    /// Create a new store rooted at the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_path(&self, snapshot: &ScanSnapshot) -> PathBuf {
        let date = snapshot.started_at.format("%Y/%m/%d");
        self.root.join(format!("{}/{}.json", date, snapshot.id))
    }

    fn find_path(&self, id: SnapshotId) -> Result<PathBuf, StoreError> {
        let filename = format!("{id}.json");
        find_file_recursive(&self.root, &filename).ok_or(StoreError::NotFound(id))
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn save(&self, snapshot: &ScanSnapshot) -> Result<StoredSnapshot, StoreError> {
        let stored = StoredSnapshot::seal(snapshot.clone())?;

        let path = self.snapshot_path(snapshot);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, json)?;

        tracing::debug!(
            snapshot_id = %snapshot.id,
            path = %path.display(),
            "Snapshot saved"
        );

        Ok(stored)
    }

    fn get(&self, id: SnapshotId) -> Result<StoredSnapshot, StoreError> {
        let path = self.find_path(id)?;
        let stored = read_stored(&path)?;

        if !stored.verify_integrity() {
            return Err(StoreError::IntegrityViolation(id));
        }

        Ok(stored)
    }

    fn list(&self, query: &SnapshotQuery) -> Result<Vec<SnapshotInfo>, StoreError> {
        let mut results = Vec::new();
        collect_snapshots_recursive(&self.root, query, &mut results)?;

        results.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    fn delete(&self, id: SnapshotId) -> Result<(), StoreError> {
        let path = self.find_path(id)?;
        fs::remove_file(&path)?;
        tracing::info!(snapshot_id = %id, "Snapshot deleted");
        Ok(())
    }
}

fn read_stored(path: &Path) -> Result<StoredSnapshot, StoreError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Recursively find a file by name.
fn find_file_recursive(dir: &Path, filename: &str) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_recursive(&path, filename) {
                return Some(found);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(filename) {
            return Some(path);
        }
    }

    None
}

/// Recursively collect listing entries matching a query.
///
/// Files that fail to parse are skipped with a warning so one damaged entry
/// does not hide the rest of the history.
fn collect_snapshots_recursive(
    dir: &Path,
    query: &SnapshotQuery,
    results: &mut Vec<SnapshotInfo>,
) -> Result<(), StoreError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries = fs::read_dir(dir)?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_snapshots_recursive(&path, query, results)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            match read_stored(&path) {
                Ok(stored) if matches_query(&stored.snapshot, query) => {
                    results.push(stored.info());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot");
                }
            }
        }
    }

    Ok(())
}

fn matches_query(snapshot: &ScanSnapshot, query: &SnapshotQuery) -> bool {
    if let Some(target) = &query.target {
        if &snapshot.target != target {
            return false;
        }
    }
    if let Some(from) = &query.from {
        if &snapshot.started_at < from {
            return false;
        }
    }
    if let Some(to) = &query.to {
        if &snapshot.started_at > to {
            return false;
        }
    }
    if let Some(min) = query.min_hosts {
        if snapshot.hosts.len() < min {
            return false;
        }
    }
    true
}
