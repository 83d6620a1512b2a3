//! Core scan data model shared across Vantage components.
//!
//! A [`ScanSnapshot`] is the complete structured output of one finished
//! network scan. Snapshots are immutable once produced: analyses borrow them
//! and build fresh result values.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Snapshot ──────────────────────────────────────────────────────

/// Unique identifier for a scan snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(pub Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a snapshot ID from its hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The result of one completed scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanSnapshot {
    pub id: SnapshotId,
    /// Target expression handed to the scanner (host, range, or CIDR).
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Hosts in scanner output order.
    pub hosts: Vec<Host>,
}

impl ScanSnapshot {
    pub fn new(
        target: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        hosts: Vec<Host>,
    ) -> Self {
        Self {
            id: SnapshotId::new(),
            target: target.into(),
            started_at,
            finished_at,
            hosts,
        }
    }

    /// Wall-clock duration of the scan.
    pub fn duration(&self) -> TimeDelta {
        self.finished_at - self.started_at
    }

    /// Look up a host by IP. When the IP appears more than once the last
    /// entry wins, matching how the differencer indexes hosts.
    pub fn host(&self, ip: &str) -> Option<&Host> {
        self.hosts.iter().rev().find(|h| h.ip == ip)
    }

    /// Total number of open ports across all hosts.
    pub fn open_port_count(&self) -> usize {
        self.hosts.iter().map(|h| h.open_ports().count()).sum()
    }

    /// A copy of this snapshot containing only the hosts with the given IP.
    ///
    /// The snapshot ID is preserved so results can still be traced back
    /// to the stored scan.
    pub fn restricted_to_host(&self, ip: &str) -> ScanSnapshot {
        ScanSnapshot {
            id: self.id,
            target: self.target.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            hosts: self.hosts.iter().filter(|h| h.ip == ip).cloned().collect(),
        }
    }
}

// ── Host / Port ───────────────────────────────────────────────────

/// A scanned host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Host {
    /// IP address; the effective primary key within a snapshot.
    pub ip: String,
    pub hostname: Option<String>,
    pub status: HostStatus,
    /// Best OS match reported by the scanner, verbatim.
    pub os: Option<String>,
    pub ports: Vec<Port>,
}

impl Host {
    /// Create an up host with no hostname, OS, or ports.
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            hostname: None,
            status: HostStatus::Up,
            os: None,
            ports: Vec::new(),
        }
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    /// Ports in state open, in scanner order.
    pub fn open_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.state == PortState::Open)
    }
}

/// A scanned port on a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Port {
    pub number: u16,
    pub protocol: Protocol,
    pub state: PortState,
    /// Service name as identified by the scanner (may be empty).
    pub service: String,
    pub version: Option<String>,
}

impl Port {
    /// An open TCP port running `service`.
    pub fn open_tcp(number: u16, service: impl Into<String>) -> Self {
        Self {
            number,
            protocol: Protocol::Tcp,
            state: PortState::Open,
            service: service.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_state(mut self, state: PortState) -> Self {
        self.state = state;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}

// ── Enums ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Up,
    Down,
    Unknown,
}

impl HostStatus {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "up" => Self::Up,
            "down" => Self::Down,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Other(String),
}

impl Protocol {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tcp" => Self::Tcp,
            "udp" => Self::Udp,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
            Self::Other(p) => f.write_str(p),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl PortState {
    /// Map a scanner state string. Compound states such as
    /// `open|filtered` are treated as filtered.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            _ => Self::Filtered,
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Filtered => "filtered",
        })
    }
}
