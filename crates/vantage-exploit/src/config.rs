//! Configuration for exploit suggestions.

use std::path::PathBuf;

use ::config::builder::DefaultState;
use ::config::ConfigBuilder;
use serde::Deserialize;
use vantage_core::config::{
    default_data_dir, environment, expand_home, file_builder, load_section, DEFAULT_CATALOG_PATH,
};

use crate::error::{Result, SuggestError};
use crate::filter::DEFAULT_DENYLIST;

/// Config file table and environment key prefix (`VANTAGE_EXPLOIT__`).
pub const SECTION: &str = "exploit";

/// Loaded from the `vantage.toml` `[exploit]` section or
/// `VANTAGE_EXPLOIT__` environment variables. `VANTAGE_EXPLOIT__DENYLIST`
/// takes a comma-separated list.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestConfig {
    /// Module metadata file. `~/` is expanded.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Snapshot history directory shared with vantage-discover. Defaults
    /// to `~/.vantage/snapshots`.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Stop once this many suggestions were accepted (default 12).
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Suggestions accepted per (host, port, service) (default 4).
    #[serde(default = "default_per_port_cap")]
    pub per_port_cap: usize,

    /// Raw candidates taken from each search (default 10).
    #[serde(default = "default_candidates_per_term")]
    pub candidates_per_term: usize,

    /// Identifier substrings that always reject a module.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

impl SuggestConfig {
    /// Load from `{file_prefix}.toml` and the environment.
    pub fn load(file_prefix: &str) -> Result<Self> {
        Self::from_sources(file_builder(file_prefix), environment())
    }

    fn from_sources(
        builder: ConfigBuilder<DefaultState>,
        env: ::config::Environment,
    ) -> Result<Self> {
        let env = env
            .list_separator(",")
            .with_list_parse_key(&format!("{SECTION}.denylist"));
        load_section(builder.add_source(env), SECTION)
            .map_err(|e| SuggestError::Config(e.to_string()))
    }

    pub fn catalog_path(&self) -> Result<PathBuf> {
        expand_home(&self.catalog_path).map_err(|e| SuggestError::Config(e.to_string()))
    }

    pub fn snapshot_dir(&self) -> Result<PathBuf> {
        let resolved = match &self.data_dir {
            Some(dir) => expand_home(dir),
            None => default_data_dir().map(|d| d.join("snapshots")),
        };
        resolved.map_err(|e| SuggestError::Config(e.to_string()))
    }

    /// Reject limits that would make every run empty.
    pub fn validate(&self) -> Result<()> {
        if self.per_port_cap == 0 {
            return Err(SuggestError::Config("per_port_cap must be at least 1".to_string()));
        }
        if self.candidates_per_term == 0 {
            return Err(SuggestError::Config(
                "candidates_per_term must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_catalog_path() -> String {
    DEFAULT_CATALOG_PATH.to_string()
}

fn default_max_results() -> usize {
    12
}

fn default_per_port_cap() -> usize {
    4
}

fn default_candidates_per_term() -> usize {
    10
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect()
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            data_dir: None,
            max_results: default_max_results(),
            per_port_cap: default_per_port_cap(),
            candidates_per_term: default_candidates_per_term(),
            denylist: default_denylist(),
        }
    }
}
