//! vantage-core: Shared scan data model and ambient plumbing for Vantage.
//!
//! This crate provides the foundational pieces used across all Vantage components:
//! - Snapshot types (ScanSnapshot, Host, Port) produced by the scanner
//! - Filesystem location helpers for configuration
//! - An owned ring buffer of recent log lines for interactive surfaces
//! - Common error types

pub mod config;
pub mod error;
pub mod logbuf;
pub mod types;

pub use error::CoreError;
pub use logbuf::{LogBuffer, LogBufferLayer};
pub use types::{Host, HostStatus, Port, PortState, Protocol, ScanSnapshot, SnapshotId};
