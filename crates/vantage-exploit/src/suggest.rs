//! Suggestion ranking and de-duplication.
//!
//! Walks the open ports of a snapshot in order, searches the module source
//! once per distinct term, filters the candidates, and caps the results
//! per port and overall. The final list is sorted by rank, then name.

use std::collections::{HashMap, HashSet};

use vantage_core::types::{Port, ScanSnapshot};

use crate::config::SuggestConfig;
use crate::context::{build_context, HostContext};
use crate::error::Result;
use crate::filter::CandidateFilter;
use crate::matching::MatchRules;
use crate::rank::rank_order;
use crate::source::{ModuleSource, SearchQuery};
use crate::types::ExploitSuggestion;

/// Shown when a module carries no description.
pub const DEFAULT_DESCRIPTION: &str = "N/A";
/// Shown when a module carries no rank.
pub const DEFAULT_RANK: &str = "unknown";

/// Configured suggestion engine. Holds no per-run state.
#[derive(Debug, Clone)]
pub struct Suggester {
    max_results: usize,
    per_port_cap: usize,
    candidates_per_term: usize,
    rules: MatchRules,
    filter: CandidateFilter,
}

impl Suggester {
    pub fn new(config: &SuggestConfig) -> Self {
        Self {
            max_results: config.max_results,
            per_port_cap: config.per_port_cap,
            candidates_per_term: config.candidates_per_term,
            rules: MatchRules::default(),
            filter: CandidateFilter::new(config.denylist.iter().cloned()),
        }
    }

    /// Replace the service matching rules.
    pub fn with_rules(mut self, rules: MatchRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn filter(&self) -> &CandidateFilter {
        &self.filter
    }

    /// Rank suggestions for every open port in `snapshot`.
    ///
    /// A failed search is logged and its term skipped; the rest of the run
    /// continues.
    pub fn suggest(
        &self,
        source: &dyn ModuleSource,
        snapshot: &ScanSnapshot,
    ) -> Vec<ExploitSuggestion> {
        let mut run = Run::default();

        'ports: for host in &snapshot.hosts {
            for port in host.open_ports() {
                if run.accepted.len() >= self.max_results {
                    break 'ports;
                }
                let ctx = build_context(host, port);
                if ctx.service.is_empty() {
                    tracing::debug!(host = %host.ip, port = port.number, "Skipping port without service name");
                    continue;
                }

                for term in search_terms(&ctx, port) {
                    if run.accepted.len() >= self.max_results {
                        break 'ports;
                    }
                    if !run.searched.insert(term.clone()) {
                        continue;
                    }
                    let query = SearchQuery {
                        term: &term,
                        service: &ctx.service,
                        limit: self.candidates_per_term,
                        rules: &self.rules,
                    };
                    let candidates = match source.search(&query) {
                        Ok(c) => c,
                        Err(e) => {
                            tracing::warn!(term = %term, error = %e, "Module search failed, skipping term");
                            continue;
                        }
                    };

                    for name in candidates {
                        if run.accepted.len() >= self.max_results {
                            break 'ports;
                        }
                        self.consider(&mut run, source, &host.ip, port, &ctx, name);
                    }
                }
            }
        }

        let mut suggestions = run.accepted;
        suggestions.sort_by(|a, b| {
            rank_order(&a.rank)
                .cmp(&rank_order(&b.rank))
                .then_with(|| a.module_name.cmp(&b.module_name))
        });

        tracing::info!(
            snapshot_id = %snapshot.id,
            suggestions = suggestions.len(),
            terms_searched = run.searched.len(),
            "Exploit suggestions ranked"
        );
        suggestions
    }

    fn consider(
        &self,
        run: &mut Run,
        source: &dyn ModuleSource,
        ip: &str,
        port: &Port,
        ctx: &HostContext,
        name: String,
    ) {
        if run.seen.contains(&name) || !self.filter.is_relevant(ctx, &name) {
            return;
        }
        let count = run
            .per_port
            .entry((ip.to_string(), port.number, ctx.service.clone()))
            .or_insert(0);
        if *count >= self.per_port_cap {
            return;
        }

        let (description, rank) = match source.lookup(&name) {
            Ok(entry) => (entry.description.clone(), entry.rank.clone()),
            Err(e) => {
                tracing::debug!(module = %name, error = %e, "No metadata for module");
                (None, None)
            }
        };

        *count += 1;
        run.seen.insert(name.clone());
        run.accepted.push(ExploitSuggestion {
            module_name: name,
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            rank: rank.unwrap_or_else(|| DEFAULT_RANK.to_string()),
            target_host: ip.to_string(),
            port: port.number,
            service: port.service.clone(),
        });
    }
}

impl Default for Suggester {
    fn default() -> Self {
        Self::new(&SuggestConfig::default())
    }
}

/// State local to one `suggest` call.
#[derive(Default)]
struct Run {
    searched: HashSet<String>,
    seen: HashSet<String>,
    per_port: HashMap<(String, u16, String), usize>,
    accepted: Vec<ExploitSuggestion>,
}

/// `service`, `service port`, and `service version` when a version is
/// known.
fn search_terms(ctx: &HostContext, port: &Port) -> Vec<String> {
    let mut terms = vec![ctx.service.clone(), format!("{} {}", ctx.service, ctx.port)];
    if let Some(version) = port.version.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        terms.push(format!("{} {}", ctx.service, version));
    }
    terms
}

/// Suggest exploits for a snapshot using the limits in `config`.
pub fn suggest_exploits(
    source: &dyn ModuleSource,
    snapshot: &ScanSnapshot,
    config: &SuggestConfig,
) -> Result<Vec<ExploitSuggestion>> {
    config.validate()?;
    Ok(Suggester::new(config).suggest(source, snapshot))
}
