//! Result types produced by the suggestion engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A module proposed for one open port on one host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExploitSuggestion {
    pub module_name: String,
    pub description: String,
    pub rank: String,
    pub target_host: String,
    pub port: u16,
    pub service: String,
}

/// Record of an execution request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExploitRun {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub module: String,
    pub target: String,
    pub success: bool,
    pub output: String,
}
