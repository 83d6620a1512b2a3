//! Relevance filter applied to every candidate module.
//!
//! Two checks on the lowercased module identifier: a denylist of noisy
//! module families, then a platform check comparing the host OS with the
//! platform segment of the module path.

use crate::context::HostContext;

/// Module families that are almost never useful against a scanned service.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "scada/",
    "dlink",
    "netgear",
    "linksys",
    "zyxel",
    "tplink",
    "/browser/",
    "/fileformat/",
    "/local/",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// Classify a lowercased host OS string.
    pub fn of_host(os: &str) -> Option<Self> {
        if os.contains("windows") {
            Some(Self::Windows)
        } else if os.contains("linux") || os.contains("unix") {
            Some(Self::Unix)
        } else {
            None
        }
    }

    /// Classify a lowercased module identifier by its platform segment.
    pub fn of_module(module: &str) -> Option<Self> {
        if module.contains("windows/") {
            Some(Self::Windows)
        } else if module.contains("linux/") || module.contains("unix/") {
            Some(Self::Unix)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandidateFilter {
    denylist: Vec<String>,
}

impl CandidateFilter {
    pub fn new(denylist: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            denylist: denylist
                .into_iter()
                .map(|d| d.into().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether `module` is plausibly relevant to the host and service in
    /// `ctx`. Pure: the answer depends only on the arguments and the
    /// denylist.
    pub fn is_relevant(&self, ctx: &HostContext, module: &str) -> bool {
        let module = module.to_lowercase();

        if self.denylist.iter().any(|d| module.contains(d.as_str())) {
            return false;
        }

        if ctx.os.is_empty() {
            return true;
        }
        match (Platform::of_host(&ctx.os), Platform::of_module(&module)) {
            (Some(host), Some(target)) => host == target,
            _ => true,
        }
    }

    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}
