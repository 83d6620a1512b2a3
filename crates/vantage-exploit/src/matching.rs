//! Rule table deciding whether a module identifier matches a service name.
//!
//! Each rule maps a set of service names to a matcher. Services without a
//! rule fall back to token-boundary matching: the service name must appear
//! in the identifier delimited by `/`, `_`, or the ends of the string.

use serde::{Deserialize, Serialize};

/// How a module identifier is tested against a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Identifier must contain one of these path segments.
    PathSegment(Vec<String>),
    /// Identifier must contain the service name as a delimited token.
    TokenBoundary,
}

impl Matcher {
    /// Both arguments are expected in lowercase.
    pub fn matches(&self, service: &str, module: &str) -> bool {
        match self {
            Self::PathSegment(segments) => segments.iter().any(|s| module.contains(s.as_str())),
            Self::TokenBoundary => contains_token(module, service),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    /// Service names this rule applies to, lowercase.
    pub services: Vec<String>,
    pub matcher: Matcher,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRules {
    rules: Vec<MatchRule>,
    fallback: Matcher,
}

impl MatchRules {
    /// A table with the given rules and token-boundary fallback.
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self {
            rules,
            fallback: Matcher::TokenBoundary,
        }
    }

    /// The matcher for a service. First matching rule wins.
    pub fn matcher_for(&self, service: &str) -> &Matcher {
        self.rules
            .iter()
            .find(|r| r.services.iter().any(|s| s == service))
            .map(|r| &r.matcher)
            .unwrap_or(&self.fallback)
    }

    /// Whether `module` is a candidate for `service`. Case-insensitive.
    /// An empty service never matches.
    pub fn matches(&self, service: &str, module: &str) -> bool {
        let service = service.trim().to_lowercase();
        if service.is_empty() {
            return false;
        }
        let module = module.to_lowercase();
        self.matcher_for(&service).matches(&service, &module)
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }
}

impl Default for MatchRules {
    /// Web services match on the framework's web path segments, since
    /// "http" alone appears in far too many identifiers.
    fn default() -> Self {
        Self::new(vec![MatchRule {
            services: vec!["http".to_string(), "https".to_string()],
            matcher: Matcher::PathSegment(vec!["/http/".to_string(), "/webapp/".to_string()]),
        }])
    }
}

/// True if any occurrence of `token` in `haystack` is delimited on both
/// sides by `/`, `_`, or the string boundary.
pub fn contains_token(haystack: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let is_delim = |c: Option<char>| matches!(c, None | Some('/') | Some('_'));
    haystack.match_indices(token).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + token.len()..].chars().next();
        is_delim(before) && is_delim(after)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_boundaries() {
        assert!(contains_token("exploit/windows/smb/ms17_010_eternalblue", "smb"));
        assert!(contains_token("exploit/unix/ftp/vsftpd_234_backdoor", "vsftpd"));
        assert!(contains_token("ssh", "ssh"));
        assert!(!contains_token("exploit/linux/misc/sshd_exec", "ssh"));
        assert!(!contains_token("exploit/windows/smb/smbghost", "smb_x"));
        assert!(!contains_token("anything", ""));
    }

    #[test]
    fn test_later_occurrence_can_match() {
        // First "ftp" is inside "tftpd", second is delimited.
        assert!(contains_token("exploit/windows/tftpd/ftp_overflow", "ftp"));
    }

    #[test]
    fn test_http_rule_requires_web_segment() {
        let rules = MatchRules::default();
        assert!(rules.matches("http", "exploit/multi/http/struts_rce"));
        assert!(rules.matches("https", "exploit/multi/http/struts_rce"));
        assert!(rules.matches("HTTP", "exploit/unix/webapp/drupal_drupalgeddon2"));
        assert!(!rules.matches("http", "exploit/linux/misc/http_daemon_x"));
    }

    #[test]
    fn test_other_services_use_token_boundary() {
        let rules = MatchRules::default();
        assert_eq!(rules.matcher_for("mysql"), &Matcher::TokenBoundary);
        assert!(rules.matches("mysql", "exploit/linux/mysql/mysql_yassl_hello"));
        assert!(!rules.matches("sql", "exploit/linux/mysql/mysql_yassl_hello"));
        assert!(!rules.matches("", "exploit/linux/mysql/mysql_yassl_hello"));
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = MatchRules::new(vec![MatchRule {
            services: vec!["microsoft-ds".to_string()],
            matcher: Matcher::PathSegment(vec!["/smb/".to_string()]),
        }]);
        assert!(rules.matches("microsoft-ds", "exploit/windows/smb/ms17_010_eternalblue"));
        assert!(!rules.matches("microsoft-ds", "exploit/windows/http/iis_webdav"));
        assert_eq!(rules.rules().len(), 1);
    }
}
