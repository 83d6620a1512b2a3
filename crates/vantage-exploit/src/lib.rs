//! vantage-exploit: Exploit-module suggestions for scanned services.
//!
//! Matches the open services of a [`ScanSnapshot`] against a local catalog
//! of exploit-module metadata, filters out modules for the wrong platform
//! or from noisy families, and returns a capped, de-duplicated list ranked
//! by module reliability.

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod execute;
pub mod filter;
pub mod matching;
pub mod rank;
pub mod report;
pub mod source;
pub mod suggest;
pub mod types;

pub use catalog::{Catalog, CatalogCache, ModuleEntry};
pub use config::SuggestConfig;
pub use error::SuggestError;
pub use source::{ModuleSource, SearchQuery};
pub use suggest::{suggest_exploits, Suggester};
pub use types::{ExploitRun, ExploitSuggestion};

use vantage_core::types::ScanSnapshot;

use crate::matching::MatchRules;

/// Entry point tying the catalog, configuration, and ranker together.
pub struct ExploitAdvisor {
    config: SuggestConfig,
    suggester: Suggester,
}

impl ExploitAdvisor {
    /// Create an advisor with default configuration.
    pub fn new() -> Self {
        Self::with_config(SuggestConfig::default())
    }

    pub fn with_config(config: SuggestConfig) -> Self {
        let suggester = Suggester::new(&config);
        Self { config, suggester }
    }

    /// Replace the service matching rules.
    pub fn with_rules(mut self, rules: MatchRules) -> Self {
        self.suggester = self.suggester.with_rules(rules);
        self
    }

    pub fn config(&self) -> &SuggestConfig {
        &self.config
    }

    pub fn suggester(&self) -> &Suggester {
        &self.suggester
    }

    /// Load the configured catalog file.
    pub fn load_catalog(&self) -> error::Result<Catalog> {
        Catalog::load(self.config.catalog_path()?)
    }

    /// Load the catalog and suggest exploits for every host in `snapshot`.
    ///
    /// An unreadable catalog is an error; an empty result is not.
    pub fn suggest(&self, snapshot: &ScanSnapshot) -> error::Result<Vec<ExploitSuggestion>> {
        let catalog = self.load_catalog()?;
        self.suggest_with(&catalog, snapshot)
    }

    /// Suggest exploits using an already available module source.
    pub fn suggest_with(
        &self,
        source: &dyn ModuleSource,
        snapshot: &ScanSnapshot,
    ) -> error::Result<Vec<ExploitSuggestion>> {
        self.config.validate()?;
        Ok(self.suggester.suggest(source, snapshot))
    }

    /// Suggest exploits for a single host of the snapshot.
    pub fn suggest_for_host(
        &self,
        source: &dyn ModuleSource,
        snapshot: &ScanSnapshot,
        ip: &str,
    ) -> error::Result<Vec<ExploitSuggestion>> {
        let restricted = snapshot.restricted_to_host(ip);
        if restricted.hosts.is_empty() {
            tracing::warn!(host = %ip, snapshot_id = %snapshot.id, "Host not present in snapshot");
        }
        self.suggest_with(source, &restricted)
    }
}

impl Default for ExploitAdvisor {
    fn default() -> Self {
        Self::new()
    }
}
