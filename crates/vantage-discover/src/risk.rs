//! Port risk rules and per-scan risk labels.
//!
//! Two independent tables: [`PORT_RULES`] annotates well-known services
//! that should rarely be reachable, and [`CRITICAL_PORTS`] drives the
//! coarse risk label shown in history listings and reports.
//!
//! Label thresholds (open ports on the critical list, summed over hosts):
//! `>= 8` high, `>= 3` medium, `>= 1` low, otherwise very low.

use std::fmt;

use serde::Serialize;
use vantage_core::types::{Host, ScanSnapshot};

/// Severity of a port rule, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known-risky service on a fixed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortRule {
    pub port: u16,
    pub protocol: &'static str,
    pub service: &'static str,
    pub risk: RiskLevel,
    pub note: &'static str,
}

const fn rule(
    port: u16,
    protocol: &'static str,
    service: &'static str,
    risk: RiskLevel,
    note: &'static str,
) -> PortRule {
    PortRule {
        port,
        protocol,
        service,
        risk,
        note,
    }
}

use RiskLevel::{Critical, High, Medium};

pub const PORT_RULES: &[PortRule] = &[
    rule(22, "tcp", "ssh", High, "Remote shell access; prefer keys over passwords"),
    rule(3306, "tcp", "mysql", Critical, "Database reachable from the network; restrict access"),
    rule(5432, "tcp", "postgresql", Critical, "Database reachable from the network; restrict access"),
    rule(27017, "tcp", "mongodb", Critical, "No authentication by default"),
    rule(6379, "tcp", "redis", Critical, "Cache without authentication; data exposed"),
    rule(5984, "tcp", "couchdb", Critical, "Database reachable from the network"),
    rule(9200, "tcp", "elasticsearch", Critical, "Search API exposed; sensitive data at risk"),
    rule(8080, "tcp", "http-proxy", High, "Alternate web service"),
    rule(3389, "tcp", "rdp", High, "Windows remote desktop; frequent attack target"),
    rule(139, "tcp", "netbios", High, "Windows file sharing"),
    rule(445, "tcp", "smb", High, "File sharing; ransomware entry point"),
    rule(21, "tcp", "ftp", High, "Cleartext file transfer; use SFTP"),
    rule(23, "tcp", "telnet", Critical, "Cleartext remote shell; obsolete"),
    rule(25, "tcp", "smtp", Medium, "Mail server; check relay and authentication"),
    rule(53, "tcp", "dns", Medium, "Name service; check zone transfers"),
    rule(111, "tcp", "rpcbind", High, "RPC portmapper leaks service details"),
    rule(161, "udp", "snmp", High, "Network management; default communities are common"),
    rule(389, "tcp", "ldap", Medium, "Directory service; check user enumeration"),
    rule(8443, "tcp", "https", Medium, "Alternate HTTPS; verify the certificate"),
    rule(9000, "tcp", "fastcgi", High, "FastCGI interface; remote execution risk"),
];

/// Rules registered for a port number, in table order. Protocol and
/// service name are not consulted.
pub fn rules_for_port(port: u16) -> impl Iterator<Item = &'static PortRule> {
    PORT_RULES.iter().filter(move |r| r.port == port)
}

/// Ports whose exposure counts toward the risk label.
pub const CRITICAL_PORTS: [u16; 17] = [
    21, 22, 23, 25, 53, 80, 110, 139, 143, 389, 443, 445, 1433, 1521, 3306, 3389, 5900,
];

pub fn is_critical_port(port: u16) -> bool {
    CRITICAL_PORTS.contains(&port)
}

/// Open ports of `host` on the critical list.
pub fn critical_open_ports(host: &Host) -> usize {
    host.open_ports().filter(|p| is_critical_port(p.number)).count()
}

/// Coarse risk label for a whole scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanRisk {
    /// The scan found no hosts.
    NoData,
    VeryLow,
    Low,
    Medium,
    High,
}

impl ScanRisk {
    pub fn from_critical_count(count: usize) -> Self {
        match count {
            n if n >= 8 => Self::High,
            n if n >= 3 => Self::Medium,
            n if n >= 1 => Self::Low,
            _ => Self::VeryLow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoData => "no data",
            Self::VeryLow => "very low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ScanRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn scan_risk(snapshot: &ScanSnapshot) -> ScanRisk {
    if snapshot.hosts.is_empty() {
        return ScanRisk::NoData;
    }
    let critical = snapshot.hosts.iter().map(critical_open_ports).sum();
    ScanRisk::from_critical_count(critical)
}
