//! Plain-text scan report.

use std::fmt::Write as _;

use vantage_core::types::{Port, ScanSnapshot};

use crate::diff::format_elapsed;
use crate::risk::{is_critical_port, rules_for_port, scan_risk};

/// Which open ports a report lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFilter {
    #[default]
    All,
    /// Ports on the critical list only.
    Critical,
    /// `http` and `https` services only.
    Web,
}

impl ReportFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "critical" => Some(Self::Critical),
            "web" => Some(Self::Web),
            _ => None,
        }
    }

    fn shows(&self, port: &Port) -> bool {
        match self {
            Self::All => true,
            Self::Critical => is_critical_port(port.number),
            Self::Web => is_web(port),
        }
    }
}

fn is_web(port: &Port) -> bool {
    matches!(port.service.to_lowercase().as_str(), "http" | "https")
}

/// Render a snapshot as a text report.
///
/// The per-host risk estimate counts only the critical ports the filter
/// lets through.
pub fn render_scan_report(snapshot: &ScanSnapshot, filter: ReportFilter) -> String {
    let open_ports = snapshot.open_port_count();
    let web_services = snapshot
        .hosts
        .iter()
        .flat_map(|h| h.open_ports())
        .filter(|p| is_web(p))
        .count();

    let mut out = String::new();
    let _ = writeln!(out, "SCAN REPORT");
    let _ = writeln!(out);
    let _ = writeln!(out, "Target:       {}", snapshot.target);
    let _ = writeln!(out, "Hosts:        {}", snapshot.hosts.len());
    let _ = writeln!(out, "Open ports:   {open_ports}");
    let _ = writeln!(out, "Web services: {web_services}");
    let _ = writeln!(out, "Duration:     {}", format_elapsed(snapshot.duration()));
    let _ = writeln!(out, "Started:      {}", snapshot.started_at.format("%H:%M:%S"));
    let _ = writeln!(out, "Finished:     {}", snapshot.finished_at.format("%H:%M:%S"));
    let _ = writeln!(out, "Scan risk:    {}", scan_risk(snapshot));
    let _ = writeln!(out);

    if snapshot.hosts.is_empty() {
        let _ = writeln!(out, "No live hosts found.");
        return out;
    }

    let _ = writeln!(out, "DISCOVERED HOSTS:");
    let _ = writeln!(out);
    for (i, host) in snapshot.hosts.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, host.ip);
        if let Some(hostname) = &host.hostname {
            let _ = writeln!(out, "   Hostname: {hostname}");
        }
        let _ = writeln!(out, "   Status: {}", host.status);
        if let Some(os) = &host.os {
            let _ = writeln!(out, "   OS: {os}");
        }

        if !host.ports.is_empty() {
            let _ = writeln!(out, "   Ports:");
            let mut critical = 0;
            for port in host.open_ports().filter(|p| filter.shows(p)) {
                if is_critical_port(port.number) {
                    critical += 1;
                }
                let service = match &port.version {
                    Some(v) => format!("{} ({v})", port.service),
                    None => port.service.clone(),
                };
                let _ = writeln!(
                    out,
                    "     - {}/{}: {} [{}]",
                    port.number, port.protocol, port.state, service
                );
                for rule in rules_for_port(port.number) {
                    let _ = writeln!(out, "       ! {}: {}", rule.risk, rule.note);
                }
            }

            match critical {
                0 => {
                    let _ = writeln!(out, "   Estimated risk: LOW (no critical ports open)");
                }
                1 => {
                    let _ = writeln!(out, "   Estimated risk: HIGH (1 critical port open)");
                }
                n => {
                    let _ = writeln!(out, "   Estimated risk: HIGH ({n} critical ports open)");
                }
            }
        }
        let _ = writeln!(out);
    }

    out
}
