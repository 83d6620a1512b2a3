//! Local exploit-module catalog.
//!
//! The catalog is the framework's cached module metadata: one JSON object
//! keyed by module identifier, each value an object with at least a
//! `description` and a `rank`. A [`Catalog`] is an immutable snapshot of
//! that file taken at load time.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Result, SuggestError};
use crate::rank::Rank;
use crate::source::{ModuleSource, SearchQuery};

/// Identifier prefixes marking exploit modules.
const EXPLOIT_PREFIXES: [&str; 2] = ["exploit/", "exploit_"];

/// One catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleEntry {
    pub name: String,
    pub description: Option<String>,
    /// Rank label; numeric ranks are converted on load.
    pub rank: Option<String>,
    /// All fields as found in the catalog.
    pub metadata: Map<String, Value>,
}

impl ModuleEntry {
    fn from_value(name: &str, value: Value) -> Self {
        let metadata = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let description = metadata
            .get("description")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let rank = metadata.get("rank").and_then(rank_label);
        Self {
            name: name.to_string(),
            description,
            rank,
            metadata,
        }
    }

    pub fn is_exploit(&self) -> bool {
        is_exploit_module(&self.name)
    }
}

fn rank_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => n
            .as_i64()
            .and_then(Rank::from_numeric)
            .map(|r| r.as_str().to_string()),
        _ => None,
    }
}

pub fn is_exploit_module(name: &str) -> bool {
    EXPLOIT_PREFIXES.iter().any(|p| name.starts_with(p))
}

#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    modules: BTreeMap<String, ModuleEntry>,
}

impl Catalog {
    /// Load and parse the catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SuggestError::CatalogUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(path, &content)?;
        tracing::info!(
            path = %path.display(),
            modules = catalog.len(),
            "Module catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse catalog content; `path` is only used for error reporting.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let value: Value = serde_json::from_str(content).map_err(|e| SuggestError::CatalogCorrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let Value::Object(object) = value else {
            return Err(SuggestError::CatalogCorrupt {
                path,
                reason: "top-level value is not an object".to_string(),
            });
        };

        let modules = object
            .into_iter()
            .map(|(name, value)| {
                let entry = ModuleEntry::from_value(&name, value);
                (name, entry)
            })
            .collect();
        Ok(Self { path, modules })
    }

    /// Build a catalog from ready-made entries.
    pub fn from_entries(entries: impl IntoIterator<Item = ModuleEntry>) -> Self {
        Self {
            path: PathBuf::new(),
            modules: entries.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    /// Exploit module identifiers, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.modules
            .keys()
            .map(String::as_str)
            .filter(|n| is_exploit_module(n))
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Result<&ModuleEntry> {
        self.modules
            .get(name)
            .ok_or_else(|| SuggestError::ModuleNotFound {
                name: name.to_string(),
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total entries, including non-exploit modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleSource for Catalog {
    fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<String>> {
        Ok(self
            .list()
            .into_iter()
            .filter(|name| query.rules.matches(query.service, name))
            .take(query.limit)
            .map(String::from)
            .collect())
    }

    fn lookup(&self, name: &str) -> Result<&ModuleEntry> {
        Catalog::lookup(self, name)
    }
}

/// Lazily loaded catalog, reloaded only after an explicit
/// [`invalidate`](CatalogCache::invalidate).
#[derive(Debug)]
pub struct CatalogCache {
    path: PathBuf,
    cached: Option<Catalog>,
}

impl CatalogCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
        }
    }

    /// The cached catalog, loading it on first use.
    pub fn get(&mut self) -> Result<&Catalog> {
        let catalog = match self.cached.take() {
            Some(catalog) => catalog,
            None => Catalog::load(&self.path)?,
        };
        Ok(self.cached.insert(catalog))
    }

    /// Drop the cached copy; the next `get` reads the file again.
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            tracing::debug!(path = %self.path.display(), "Module catalog cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }
}
