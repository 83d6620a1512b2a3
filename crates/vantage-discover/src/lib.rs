//! vantage-discover: Host discovery and scan history for Vantage.
//!
//! Wraps nmap to scan targets, converts its XML into [`ScanSnapshot`]s,
//! keeps them in the snapshot store, and diffs any two snapshots to show
//! which hosts and ports appeared or disappeared. Snapshots can also be
//! rated by exposed critical ports and rendered as text reports.
//!
//! [`ScanSnapshot`]: vantage_core::types::ScanSnapshot

pub mod config;
pub mod convert;
pub mod diff;
pub mod error;
pub mod export;
pub mod history;
pub mod nmap_xml;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod scanner;

pub use diff::{compare, compare_chronological, compare_snapshots, ComparisonResult, PortChange};
pub use error::DiscoverError;
