//! BLAKE3 content hashing for tamper evidence.
//!
//! The snapshot is serialized to JSON with field order fixed by the struct
//! definitions, so the same snapshot always hashes to the same value.

use vantage_core::types::ScanSnapshot;

/// Compute the hex-encoded BLAKE3 hash of a snapshot's content.
pub fn compute_snapshot_hash(snapshot: &ScanSnapshot) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(snapshot)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}
