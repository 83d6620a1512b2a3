//! Error types for the vantage-exploit crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Module catalog unavailable at {path}: {source}")]
    CatalogUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Module catalog at {path} is corrupt: {reason}")]
    CatalogCorrupt { path: PathBuf, reason: String },

    #[error("Module not found: {name}")]
    ModuleNotFound { name: String },

    #[error("Module search for '{term}' failed: {reason}")]
    Lookup { term: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SuggestError>;
