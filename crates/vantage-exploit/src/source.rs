//! Abstraction over where candidate modules come from.

use crate::catalog::ModuleEntry;
use crate::error::Result;
use crate::matching::MatchRules;

/// One candidate search.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    /// Search term, used for logging and memoization by callers.
    pub term: &'a str,
    /// Lowercased service name the identifiers are matched against.
    pub service: &'a str,
    /// Maximum identifiers returned.
    pub limit: usize,
    pub rules: &'a MatchRules,
}

/// A searchable set of exploit modules.
pub trait ModuleSource {
    /// Identifiers of exploit modules matching `query.service` under
    /// `query.rules`, at most `query.limit` of them.
    fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<String>>;

    /// Metadata of one module.
    fn lookup(&self, name: &str) -> Result<&ModuleEntry>;
}
