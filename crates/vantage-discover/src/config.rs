//! Configuration for the vantage-discover scanner.

use std::path::PathBuf;

use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, Environment};
use serde::Deserialize;
use vantage_core::config::{default_data_dir, environment, expand_home, file_builder, load_section};

use crate::error::{DiscoverError, Result};

/// Config file table and environment key prefix (`VANTAGE_DISCOVER__`).
pub const SECTION: &str = "discover";

/// Top-level discover configuration.
///
/// Loaded from the `vantage.toml` `[discover]` section or
/// `VANTAGE_DISCOVER__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverConfig {
    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Directory holding the snapshot history. Defaults to
    /// `~/.vantage/snapshots`.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Scan profile used when none is given on the command line.
    #[serde(default)]
    pub default_profile: ScanProfile,

    /// Ask nmap for OS detection (`-O`, needs root). Never applied to
    /// loopback targets.
    #[serde(default)]
    pub os_detection: bool,

    /// Number of entries shown by `history` when no limit is given.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Recent log lines kept for display after a failed command.
    #[serde(default = "default_log_buffer_capacity")]
    pub log_buffer_capacity: usize,
}

impl DiscoverConfig {
    /// Load from `{file_prefix}.toml` and the environment.
    pub fn load(file_prefix: &str) -> Result<Self> {
        Self::from_sources(file_builder(file_prefix), environment())
    }

    fn from_sources(builder: ConfigBuilder<DefaultState>, env: Environment) -> Result<Self> {
        load_section(builder.add_source(env), SECTION)
            .map_err(|e| DiscoverError::Config(e.to_string()))
    }

    /// Resolve the snapshot directory.
    pub fn snapshot_dir(&self) -> Result<PathBuf> {
        let resolved = match &self.data_dir {
            Some(dir) => expand_home(dir),
            None => default_data_dir().map(|d| d.join("snapshots")),
        };
        resolved.map_err(|e| DiscoverError::Config(e.to_string()))
    }
}

/// Predefined scan profiles mapping to nmap flag sets.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanProfile {
    /// Common ports with version detection: `-T4 -sV -p 1-1000`
    Fast,
    /// Adds default scripts: `-T4 -sV -sC -p 1-1000`
    #[default]
    Balanced,
    /// All ports plus vulnerability scripts: `-T4 -sV -sC --script vuln -p-`
    Deep,
}

impl ScanProfile {
    /// Return the nmap flags for this profile.
    pub fn nmap_flags(&self) -> Vec<&'static str> {
        match self {
            Self::Fast => vec!["-T4", "-sV", "-p", "1-1000"],
            Self::Balanced => vec!["-T4", "-sV", "-sC", "-p", "1-1000"],
            Self::Deep => vec!["-T4", "-sV", "-sC", "--script", "vuln", "-p-"],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "balanced" => Some(Self::Balanced),
            "deep" => Some(Self::Deep),
            _ => None,
        }
    }
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_history_limit() -> usize {
    50
}

fn default_log_buffer_capacity() -> usize {
    vantage_core::logbuf::DEFAULT_CAPACITY
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            data_dir: None,
            default_profile: ScanProfile::default(),
            os_detection: false,
            history_limit: default_history_limit(),
            log_buffer_capacity: default_log_buffer_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_profile_flags() {
        assert_eq!(ScanProfile::Fast.nmap_flags(), vec!["-T4", "-sV", "-p", "1-1000"]);
        assert!(ScanProfile::Balanced.nmap_flags().contains(&"-sC"));
        let deep = ScanProfile::Deep.nmap_flags();
        assert!(deep.contains(&"vuln"));
        assert!(deep.contains(&"-p-"));
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!(ScanProfile::parse("FAST"), Some(ScanProfile::Fast));
        assert_eq!(ScanProfile::parse("deep"), Some(ScanProfile::Deep));
        assert_eq!(ScanProfile::parse("stealth"), None);
    }

    #[test]
    fn test_default_config() {
        let config = DiscoverConfig::default();
        assert_eq!(config.nmap_path, "nmap");
        assert_eq!(config.default_profile, ScanProfile::Balanced);
        assert!(!config.os_detection);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.log_buffer_capacity, 50);
    }

    fn sources(toml: &str, vars: &[(&str, &str)]) -> (ConfigBuilder<DefaultState>, Environment) {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml));
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        (builder, environment().source(Some(map)))
    }

    #[test]
    fn test_load_from_file_and_env() {
        let (builder, env) = sources(
            "[discover]\ndefault_profile = \"deep\"\nhistory_limit = 10",
            &[
                ("VANTAGE_DISCOVER__NMAP_PATH", "/opt/nmap/bin/nmap"),
                ("VANTAGE_DISCOVER__OS_DETECTION", "true"),
            ],
        );
        let config = DiscoverConfig::from_sources(builder, env).unwrap();
        assert_eq!(config.default_profile, ScanProfile::Deep);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.nmap_path, "/opt/nmap/bin/nmap");
        assert!(config.os_detection);
    }

    #[test]
    fn test_invalid_profile_is_error() {
        let (builder, env) = sources("[discover]\ndefault_profile = \"stealth\"", &[]);
        assert!(matches!(
            DiscoverConfig::from_sources(builder, env),
            Err(DiscoverError::Config(_))
        ));
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let (builder, env) = sources("[exploit]\nmax_results = 3", &[]);
        let config = DiscoverConfig::from_sources(builder, env).unwrap();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.default_profile, ScanProfile::Balanced);
    }

    #[test]
    fn test_explicit_data_dir() {
        let config = DiscoverConfig {
            data_dir: Some("/var/lib/vantage".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.snapshot_dir().unwrap(),
            PathBuf::from("/var/lib/vantage")
        );
    }
}
