//! Snapshot export to JSON and CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use vantage_core::types::ScanSnapshot;

use crate::error::Result;

const CSV_HEADER: [&str; 9] = [
    "ip", "hostname", "status", "os", "port", "protocol", "state", "service", "version",
];

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::parse)
    }
}

/// Write a snapshot as pretty-printed JSON.
pub fn write_json<W: Write>(snapshot: &ScanSnapshot, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

/// Write a snapshot as CSV, one row per port.
///
/// A host without ports still gets a row, with `N/A` in every port column.
pub fn write_csv<W: Write>(snapshot: &ScanSnapshot, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for host in &snapshot.hosts {
        let status = host.status.to_string();
        let host_cols = [
            host.ip.as_str(),
            host.hostname.as_deref().unwrap_or(""),
            status.as_str(),
            host.os.as_deref().unwrap_or(""),
        ];

        if host.ports.is_empty() {
            let mut row: Vec<&str> = host_cols.to_vec();
            row.extend([NOT_AVAILABLE; 5]);
            wtr.write_record(&row)?;
            continue;
        }

        for port in &host.ports {
            let number = port.number.to_string();
            let protocol = port.protocol.to_string();
            let state = port.state.to_string();
            let mut row: Vec<&str> = host_cols.to_vec();
            row.extend([
                number.as_str(),
                protocol.as_str(),
                state.as_str(),
                port.service.as_str(),
                port.version.as_deref().unwrap_or(""),
            ]);
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Export a snapshot to a file in the given format.
pub fn export_to_file(snapshot: &ScanSnapshot, path: &Path, format: ExportFormat) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Json => write_json(snapshot, file)?,
        ExportFormat::Csv => write_csv(snapshot, file)?,
    }
    tracing::info!(
        snapshot_id = %snapshot.id,
        path = %path.display(),
        format = ?format,
        "Snapshot exported"
    );
    Ok(())
}
