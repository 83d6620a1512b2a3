//! Plain-text rendering of suggestion lists.

use std::fmt::Write as _;

use crate::types::ExploitSuggestion;

pub fn render_suggestions(suggestions: &[ExploitSuggestion]) -> String {
    if suggestions.is_empty() {
        return "No exploit suggestions.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "EXPLOIT SUGGESTIONS ({}):", suggestions.len());
    let _ = writeln!(out);
    for (i, s) in suggestions.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. [{}] {}", i + 1, s.rank, s.module_name);
        let _ = writeln!(out, "    target: {}:{} ({})", s.target_host, s.port, s.service);
        let _ = writeln!(out, "    {}", s.description);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let suggestions = vec![ExploitSuggestion {
            module_name: "exploit/windows/smb/ms17_010_eternalblue".to_string(),
            description: "EternalBlue".to_string(),
            rank: "excellent".to_string(),
            target_host: "10.0.0.20".to_string(),
            port: 445,
            service: "smb".to_string(),
        }];
        let text = render_suggestions(&suggestions);
        assert!(text.starts_with("EXPLOIT SUGGESTIONS (1):"));
        assert!(text.contains(" 1. [excellent] exploit/windows/smb/ms17_010_eternalblue"));
        assert!(text.contains("target: 10.0.0.20:445 (smb)"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_suggestions(&[]), "No exploit suggestions.\n");
    }
}
