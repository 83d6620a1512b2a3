//! CLI entry point for vantage-exploit.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use vantage_core::types::{ScanSnapshot, SnapshotId};
use vantage_core::logbuf::DEFAULT_LOG_FILTER;
use vantage_core::LogBuffer;
use vantage_store::{FsSnapshotStore, SnapshotQuery, SnapshotStore};

use vantage_exploit::execute::execute;
use vantage_exploit::matching::Matcher;
use vantage_exploit::report::render_suggestions;
use vantage_exploit::{ExploitAdvisor, SuggestConfig};

/// Number of buffered log lines printed after a failure.
const FAILURE_TAIL: usize = 10;

#[derive(Parser)]
#[command(name = "vantage-exploit")]
#[command(about = "Exploit-module suggestions for recorded scans")]
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
    /// Suggest exploits for a snapshot (latest recorded one by default).
    Suggest {
        /// Stored snapshot ID.
        #[arg(long, conflicts_with = "file")]
        snapshot: Option<String>,
        /// Snapshot exported as JSON.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Only suggest for this host IP.
        #[arg(long)]
        host: Option<String>,
        /// Print suggestions as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List exploit modules in the catalog.
    Modules {
        /// Only list identifiers containing this text.
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show catalog metadata for one module.
    Info { name: String },
    /// Record a (simulated) execution of a module against a target.
    Execute {
        module: String,
        target: String,
        /// Module option as KEY=VALUE; repeatable.
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
    },
    /// Show catalog location, size, and the active matching setup.
    Catalog,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SuggestConfig::load(&cli.config)?;
    let logs = init_tracing(cli.json_logs);

    let result = run(cli.command, config);
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

fn run(command: Command, config: SuggestConfig) -> anyhow::Result<()> {
    let advisor = ExploitAdvisor::with_config(config);

    match command {
        Command::Suggest {
            snapshot,
            file,
            host,
            json,
        } => {
            let snapshot = load_snapshot(advisor.config(), snapshot.as_deref(), file)?;
            let catalog = advisor.load_catalog()?;
            let suggestions = match host {
                Some(ip) => advisor.suggest_for_host(&catalog, &snapshot, &ip)?,
                None => advisor.suggest_with(&catalog, &snapshot)?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else {
                print!("{}", render_suggestions(&suggestions));
            }
        }
        Command::Modules { search } => {
            let catalog = advisor.load_catalog()?;
            let needle = search.map(|s| s.to_lowercase());
            for name in catalog.list() {
                if needle
                    .as_deref()
                    .map_or(true, |n| name.to_lowercase().contains(n))
                {
                    println!("{name}");
                }
            }
        }
        Command::Info { name } => {
            let catalog = advisor.load_catalog()?;
            let entry = catalog.lookup(&name)?;
            println!("{}", serde_json::to_string_pretty(&entry.metadata)?);
        }
        Command::Execute {
            module,
            target,
            options,
        } => {
            let catalog = advisor.load_catalog()?;
            let options = parse_options(&options)?;
            let run = execute(&catalog, &module, &target, &options)?;
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::Catalog => {
            let path = advisor.config().catalog_path()?;
            println!("path:     {}", path.display());
            match advisor.load_catalog() {
                Ok(catalog) => {
                    println!("modules:  {}", catalog.len());
                    println!("exploits: {}", catalog.list().len());
                }
                Err(e) => println!("status:   unavailable ({e})"),
            }
            let suggester = advisor.suggester();
            println!("denylist: {}", suggester.filter().denylist().join(", "));
            println!("matching:");
            for rule in suggester.rules().rules() {
                println!("  {:<16} {}", rule.services.join(", "), describe(&rule.matcher));
            }
            println!("  {:<16} {}", "(other)", describe(&Matcher::TokenBoundary));
        }
    }

    Ok(())
}

/// Resolve the snapshot to analyse: an exported file, a stored ID, or the
/// newest stored snapshot.
fn load_snapshot(
    config: &SuggestConfig,
    id: Option<&str>,
    file: Option<PathBuf>,
) -> anyhow::Result<ScanSnapshot> {
    if let Some(path) = file {
        let json = std::fs::read_to_string(&path)?;
        return Ok(serde_json::from_str(&json)?);
    }

    let store = FsSnapshotStore::new(config.snapshot_dir()?)?;
    let id = match id {
        Some(raw) => SnapshotId::parse(raw)
            .map_err(|e| anyhow::anyhow!("Invalid snapshot ID {raw}: {e}"))?,
        None => {
            let query = SnapshotQuery {
                limit: Some(1),
                ..Default::default()
            };
            match store.list(&query)?.first() {
                Some(info) => info.id,
                None => anyhow::bail!("No recorded snapshots; run vantage-discover scan first"),
            }
        }
    };
    Ok(store.get(id)?.snapshot)
}

fn describe(matcher: &Matcher) -> String {
    match matcher {
        Matcher::PathSegment(segments) => format!("path segment {}", segments.join(" | ")),
        Matcher::TokenBoundary => "service name as a delimited token".to_string(),
    }
}

fn parse_options(raw: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|opt| match opt.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            _ => anyhow::bail!("Invalid option {opt}: expected KEY=VALUE"),
        })
        .collect()
}

fn init_tracing(json: bool) -> LogBuffer {
    let logs = LogBuffer::default();
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
