//! CLI entry point for the vantage-discover scanner.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use vantage_core::types::SnapshotId;
use vantage_core::logbuf::DEFAULT_LOG_FILTER;
use vantage_core::LogBuffer;
use vantage_store::{FsSnapshotStore, SnapshotQuery, SnapshotStore};

use vantage_discover::config::{DiscoverConfig, ScanProfile};
use vantage_discover::export::{self, ExportFormat};
use vantage_discover::history::{search_history, HistoryFilter};
use vantage_discover::pipeline::run_single_scan;
use vantage_discover::report::{render_scan_report, ReportFilter};
use vantage_discover::scanner::NmapScanner;
use vantage_discover::{compare_chronological, compare_snapshots};

/// Number of buffered log lines printed after a failure.
const FAILURE_TAIL: usize = 10;

#[derive(Parser)]
#[command(name = "vantage-discover")]
#[command(about = "Nmap scanning, scan history, and snapshot comparison")]
struct Cli {
    /// Config file prefix (default: vantage).
    #[arg(short, long, default_value = "vantage", global = true)]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a target and record the snapshot.
    Scan {
        /// Host, range, or CIDR to scan.
        target: String,
        /// Scan profile: fast, balanced, deep.
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// List recorded snapshots, newest first.
    History {
        /// Only show snapshots of this target.
        #[arg(short, long)]
        target: Option<String>,
        /// Only show scans started on or after this day (YYYY-MM-DD, UTC).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Only show scans started on or before this day (YYYY-MM-DD, UTC).
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only show scans that found at least this many hosts.
        #[arg(long)]
        min_hosts: Option<usize>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print a stored snapshot as JSON.
    Show { id: String },
    /// Print a text report of a stored snapshot.
    Report {
        id: String,
        /// Ports to list: all, critical, web.
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    /// Delete a stored snapshot.
    Delete { id: String },
    /// Compare two stored snapshots (first is the older one).
    Compare {
        older: String,
        newer: String,
        /// Order the pair by start time instead of argument order.
        #[arg(long)]
        chronological: bool,
        /// Print the full result as JSON instead of the text summary.
        #[arg(long)]
        json: bool,
    },
    /// Export a stored snapshot to a JSON or CSV file.
    Export {
        id: String,
        output: PathBuf,
        /// json or csv (default: from the file extension).
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Check the nmap installation and snapshot directory.
    Diagnose,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = DiscoverConfig::load(&cli.config)?;
    let logs = init_tracing(cli.json_logs, config.log_buffer_capacity);

    let result = run(cli.command, &config).await;
    if let Err(e) = &result {
        let tail = logs.tail(FAILURE_TAIL);
        if !tail.is_empty() {
            eprintln!("Recent log lines:");
            for line in tail {
                eprintln!("  {line}");
            }
        }
        tracing::error!(error = %e, "Command failed");
    }
    result
}

async fn run(command: Command, config: &DiscoverConfig) -> anyhow::Result<()> {
    let store = FsSnapshotStore::new(config.snapshot_dir()?)?;

    match command {
        Command::Scan { target, profile } => {
            let profile = match profile {
                Some(p) => parse_profile(&p)?,
                None => config.default_profile,
            };
            let scanner =
                NmapScanner::new(&config.nmap_path).with_os_detection(config.os_detection);
            let version = scanner.verify_installation().await?;
            tracing::info!(nmap_version = %version, "Nmap verified");

            let outcome = run_single_scan(&scanner, &store, &target, profile).await?;
            let info = outcome.stored.info();
            println!(
                "Snapshot {} recorded: {} hosts, {} open ports",
                info.id, info.host_count, info.open_ports
            );
            if let Some(changes) = outcome.changes {
                println!();
                print!("{}", changes.summary);
            }
        }
        Command::History {
            target,
            from,
            to,
            min_hosts,
            limit,
        } => {
            let filter = HistoryFilter {
                target,
                from,
                to,
                min_hosts,
                limit: Some(limit.unwrap_or(config.history_limit)),
            };
            let entries = search_history(&store, &filter)?;
            if entries.is_empty() {
                println!("No snapshots recorded.");
            }
            for entry in entries {
                let info = entry.info;
                let risk = entry.risk.map_or("unknown", |r| r.as_str());
                println!(
                    "{}  {}  {:<20} hosts={} open_ports={} risk={}",
                    info.id,
                    info.started_at.format("%Y-%m-%d %H:%M:%S"),
                    info.target,
                    info.host_count,
                    info.open_ports,
                    risk
                );
            }
        }
        Command::Show { id } => {
            let stored = store.get(parse_id(&id)?)?;
            println!("{}", serde_json::to_string_pretty(&stored.snapshot)?);
        }
        Command::Report { id, filter } => {
            let filter = ReportFilter::parse(&filter).ok_or_else(|| {
                anyhow::anyhow!("Invalid filter: {filter}. Choose: all, critical, web")
            })?;
            let stored = store.get(parse_id(&id)?)?;
            print!("{}", render_scan_report(&stored.snapshot, filter));
        }
        Command::Delete { id } => {
            let id = parse_id(&id)?;
            store.delete(id)?;
            println!("Deleted snapshot {id}");
        }
        Command::Compare {
            older,
            newer,
            chronological,
            json,
        } => {
            let older = store.get(parse_id(&older)?)?.snapshot;
            let newer = store.get(parse_id(&newer)?)?.snapshot;
            let result = if chronological {
                compare_chronological(&older, &newer)?
            } else {
                compare_snapshots(Some(&older), Some(&newer))?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", result.summary);
            }
        }
        Command::Export { id, output, format } => {
            let format = match format {
                Some(f) => ExportFormat::parse(&f)
                    .ok_or_else(|| anyhow::anyhow!("Invalid format: {f}. Choose: json, csv"))?,
                None => ExportFormat::from_path(&output).ok_or_else(|| {
                    anyhow::anyhow!("Cannot infer format from {}; pass --format", output.display())
                })?,
            };
            let stored = store.get(parse_id(&id)?)?;
            export::export_to_file(&stored.snapshot, &output, format)?;
            println!("Exported snapshot {} to {}", stored.id(), output.display());
        }
        Command::Diagnose => {
            let scanner = NmapScanner::new(&config.nmap_path);
            match scanner.verify_installation().await {
                Ok(version) => println!("nmap:       {version}"),
                Err(e) => println!("nmap:       unavailable ({e})"),
            }
            println!("snapshots:  {}", store.root().display());
            let count = store.list(&SnapshotQuery::default())?.len();
            println!("recorded:   {count}");
            println!("profile:    {:?}", config.default_profile);
            println!("os detect:  {}", config.os_detection);
        }
    }

    Ok(())
}

fn init_tracing(json: bool, capacity: usize) -> LogBuffer {
    let logs = LogBuffer::with_capacity(capacity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let fmt_layer = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(logs.layer())
        .init();
    logs
}

fn parse_profile(s: &str) -> anyhow::Result<ScanProfile> {
    match ScanProfile::parse(s) {
        Some(p) => Ok(p),
        None => anyhow::bail!("Invalid profile: {s}. Choose: fast, balanced, deep"),
    }
}

fn parse_id(s: &str) -> anyhow::Result<SnapshotId> {
    SnapshotId::parse(s).map_err(|e| anyhow::anyhow!("Invalid snapshot ID {s}: {e}"))
}
