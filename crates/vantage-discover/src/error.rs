//! Error types for the vantage-discover crate.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Failed to parse nmap XML output: {0}")]
    XmlParse(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Cannot order snapshots: both started at {started_at}")]
    AmbiguousOrder { started_at: DateTime<Utc> },

    #[error("Invalid history filter: {0}")]
    InvalidFilter(String),

    #[error("Store error: {0}")]
    Store(#[from] vantage_store::StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
