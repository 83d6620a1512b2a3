//! Change detection between two scan snapshots.
//!
//! Hosts are keyed by IP and ports by `(number, protocol)`. The older
//! snapshot is whatever the caller passes first: [`compare`] never looks at
//! timestamps. [`compare_chronological`] orders the pair by start time
//! instead.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use vantage_core::types::{Host, Port, Protocol, ScanSnapshot, SnapshotId};

use crate::error::{DiscoverError, Result};

/// Whether a port appeared or disappeared between two snapshots.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Opened,
    Closed,
}

/// A port present in only one of the two snapshots, on a host present in
/// both.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PortChange {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub service: String,
    pub action: ChangeAction,
}

/// Identity of a compared snapshot, without its hosts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SnapshotRef {
    pub id: SnapshotId,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl From<&ScanSnapshot> for SnapshotRef {
    fn from(s: &ScanSnapshot) -> Self {
        Self {
            id: s.id,
            target: s.target.clone(),
            started_at: s.started_at,
            finished_at: s.finished_at,
        }
    }
}

/// Outcome of comparing an older snapshot with a newer one.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub older: SnapshotRef,
    pub newer: SnapshotRef,
    pub new_hosts: Vec<String>,
    pub removed_hosts: Vec<String>,
    pub new_ports: Vec<PortChange>,
    pub closed_ports: Vec<PortChange>,
    pub summary: String,
}

impl ComparisonResult {
    /// True when none of the four change lists has entries.
    pub fn is_empty(&self) -> bool {
        self.new_hosts.is_empty()
            && self.removed_hosts.is_empty()
            && self.new_ports.is_empty()
            && self.closed_ports.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.new_hosts.len()
            + self.removed_hosts.len()
            + self.new_ports.len()
            + self.closed_ports.len()
    }
}

/// Compare two snapshots that may not have been provided.
pub fn compare_snapshots(
    older: Option<&ScanSnapshot>,
    newer: Option<&ScanSnapshot>,
) -> Result<ComparisonResult> {
    match (older, newer) {
        (Some(older), Some(newer)) => Ok(compare(older, newer)),
        (None, _) => Err(DiscoverError::InvalidSnapshot(
            "older snapshot is missing".to_string(),
        )),
        (_, None) => Err(DiscoverError::InvalidSnapshot(
            "newer snapshot is missing".to_string(),
        )),
    }
}

/// Compare two snapshots after ordering them by start time.
///
/// Fails with [`DiscoverError::AmbiguousOrder`] when both started at the same
/// instant.
pub fn compare_chronological(a: &ScanSnapshot, b: &ScanSnapshot) -> Result<ComparisonResult> {
    if a.started_at == b.started_at {
        return Err(DiscoverError::AmbiguousOrder {
            started_at: a.started_at,
        });
    }
    let (older, newer) = if a.started_at < b.started_at {
        (a, b)
    } else {
        (b, a)
    };
    Ok(compare(older, newer))
}

/// Compute the host and port differences from `older` to `newer`.
///
/// Lists follow the order in which entries first appear in their snapshot.
/// A port present in both snapshots is never reported, even if its state,
/// service, or version changed.
pub fn compare(older: &ScanSnapshot, newer: &ScanSnapshot) -> ComparisonResult {
    let old_hosts = index_hosts(&older.hosts);
    let new_hosts = index_hosts(&newer.hosts);

    let added: Vec<String> = new_hosts
        .iter()
        .filter(|(ip, _)| old_hosts.get(ip).is_none())
        .map(|(ip, _)| ip.to_string())
        .collect();
    let removed: Vec<String> = old_hosts
        .iter()
        .filter(|(ip, _)| new_hosts.get(ip).is_none())
        .map(|(ip, _)| ip.to_string())
        .collect();

    let mut opened = Vec::new();
    let mut closed = Vec::new();
    for (ip, new_host) in new_hosts.iter() {
        let Some(old_host) = old_hosts.get(ip) else {
            continue;
        };
        let old_ports = index_ports(&old_host.ports);
        let new_ports = index_ports(&new_host.ports);

        opened.extend(
            new_ports
                .iter()
                .filter(|(key, _)| old_ports.get(key).is_none())
                .map(|(_, p)| port_change(ip, p, ChangeAction::Opened)),
        );
        closed.extend(
            old_ports
                .iter()
                .filter(|(key, _)| new_ports.get(key).is_none())
                .map(|(_, p)| port_change(ip, p, ChangeAction::Closed)),
        );
    }

    let mut result = ComparisonResult {
        older: SnapshotRef::from(older),
        newer: SnapshotRef::from(newer),
        new_hosts: added,
        removed_hosts: removed,
        new_ports: opened,
        closed_ports: closed,
        summary: String::new(),
    };
    result.summary = render_summary(&result);

    tracing::debug!(
        older = %older.id,
        newer = %newer.id,
        new_hosts = result.new_hosts.len(),
        removed_hosts = result.removed_hosts.len(),
        opened = result.new_ports.len(),
        closed = result.closed_ports.len(),
        "Snapshots compared"
    );

    result
}

/// Human-readable report of a comparison.
pub fn render_summary(result: &ComparisonResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SCAN COMPARISON");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Older: {} ({})",
        result.older.target,
        result.older.started_at.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(
        out,
        "Newer: {} ({})",
        result.newer.target,
        result.newer.started_at.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(
        out,
        "Elapsed: {}",
        format_elapsed(result.newer.started_at - result.older.started_at)
    );
    let _ = writeln!(out);

    if !result.new_hosts.is_empty() {
        let _ = writeln!(out, "NEW HOSTS ({}):", result.new_hosts.len());
        for ip in &result.new_hosts {
            let _ = writeln!(out, "  + {ip}");
        }
        let _ = writeln!(out);
    }
    if !result.removed_hosts.is_empty() {
        let _ = writeln!(out, "REMOVED HOSTS ({}):", result.removed_hosts.len());
        for ip in &result.removed_hosts {
            let _ = writeln!(out, "  - {ip}");
        }
        let _ = writeln!(out);
    }
    if !result.new_ports.is_empty() {
        let _ = writeln!(out, "OPENED PORTS ({}):", result.new_ports.len());
        for c in &result.new_ports {
            let _ = writeln!(out, "  + {}:{}/{} [{}]", c.host, c.port, c.protocol, c.service);
        }
        let _ = writeln!(out);
    }
    if !result.closed_ports.is_empty() {
        let _ = writeln!(out, "CLOSED PORTS ({}):", result.closed_ports.len());
        for c in &result.closed_ports {
            let _ = writeln!(out, "  - {}:{}/{} [{}]", c.host, c.port, c.protocol, c.service);
        }
        let _ = writeln!(out);
    }
    if result.is_empty() {
        let _ = writeln!(out, "No changes detected.");
    }
    out
}

/// Format a duration as `1d 2h 3m 4s`, omitting leading zero units.
pub fn format_elapsed(delta: TimeDelta) -> String {
    let sign = if delta < TimeDelta::zero() { "-" } else { "" };
    let total = delta.num_seconds().unsigned_abs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total % 86_400) / 3_600,
        (total % 3_600) / 60,
        total % 60,
    );

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    format!("{sign}{}", parts.join(" "))
}

fn port_change(ip: &str, port: &Port, action: ChangeAction) -> PortChange {
    PortChange {
        host: ip.to_string(),
        port: port.number,
        protocol: port.protocol.clone(),
        service: port.service.clone(),
        action,
    }
}

/// Insertion-ordered map: iteration follows first appearance of a key,
/// while a repeated key replaces the stored value.
struct Ordered<K, V> {
    order: Vec<K>,
    values: HashMap<K, V>,
}

impl<K: std::hash::Hash + Eq + Clone, V: Copy> Ordered<K, V> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            values: HashMap::new(),
        }
    }

    fn insert(&mut self, key: K, value: V) {
        if self.values.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        self.values.get(key).copied()
    }

    fn iter(&self) -> impl Iterator<Item = (&K, V)> + '_ {
        self.order.iter().map(|k| (k, self.values[k]))
    }
}

fn index_hosts(hosts: &[Host]) -> Ordered<&str, &Host> {
    let mut index = Ordered::new();
    for host in hosts {
        index.insert(host.ip.as_str(), host);
    }
    index
}

fn index_ports(ports: &[Port]) -> Ordered<(u16, &Protocol), &Port> {
    let mut index = Ordered::new();
    for port in ports {
        index.insert((port.number, &port.protocol), port);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use vantage_core::types::PortState;

    fn snapshot_at(started_at: DateTime<Utc>, hosts: Vec<Host>) -> ScanSnapshot {
        ScanSnapshot::new("10.0.0.0/24", started_at, started_at + TimeDelta::seconds(20), hosts)
    }

    fn monday() -> ScanSnapshot {
        snapshot_at(
            Utc::now() - TimeDelta::days(1),
            vec![
                Host::new("10.0.0.5").with_port(Port::open_tcp(80, "http")),
                Host::new("10.0.0.9").with_port(Port::open_tcp(3389, "ms-wbt-server")),
            ],
        )
    }

    fn tuesday() -> ScanSnapshot {
        snapshot_at(
            Utc::now(),
            vec![Host::new("10.0.0.5")
                .with_port(Port::open_tcp(22, "ssh"))
                .with_port(Port::open_tcp(80, "http"))],
        )
    }

    #[test]
    fn removed_host_and_opened_port() {
        let result = compare(&monday(), &tuesday());
        assert!(result.new_hosts.is_empty());
        assert_eq!(result.removed_hosts, vec!["10.0.0.9"]);
        assert_eq!(
            result.new_ports,
            vec![PortChange {
                host: "10.0.0.5".to_string(),
                port: 22,
                protocol: Protocol::Tcp,
                service: "ssh".to_string(),
                action: ChangeAction::Opened,
            }]
        );
        assert!(result.closed_ports.is_empty());
        assert!(result.summary.contains("REMOVED HOSTS (1):"));
        assert!(result.summary.contains("  + 10.0.0.5:22/tcp [ssh]"));
        assert!(!result.summary.contains("No changes detected."));
    }

    #[test]
    fn swapping_inputs_swaps_directions() {
        let (a, b) = (monday(), tuesday());
        let forward = compare(&a, &b);
        let backward = compare(&b, &a);

        let set = |v: &[String]| v.iter().cloned().collect::<HashSet<_>>();
        assert_eq!(set(&forward.new_hosts), set(&backward.removed_hosts));
        assert_eq!(set(&forward.removed_hosts), set(&backward.new_hosts));
        assert_eq!(backward.closed_ports.len(), 1);
        assert_eq!(backward.closed_ports[0].port, 22);
        assert_eq!(backward.closed_ports[0].action, ChangeAction::Closed);
    }

    #[test]
    fn self_comparison_is_empty() {
        let a = monday();
        let result = compare(&a, &a);
        assert!(result.is_empty());
        assert_eq!(result.change_count(), 0);
        assert!(result.summary.ends_with("No changes detected.\n"));
    }

    #[test]
    fn port_attribute_changes_are_not_reported() {
        let a = monday();
        let mut b = monday();
        b.hosts[0].ports[0] = Port::open_tcp(80, "http")
            .with_version("nginx 1.25")
            .with_state(PortState::Filtered);
        assert!(compare(&a, &b).is_empty());
    }

    #[test]
    fn protocol_is_part_of_port_key() {
        let a = snapshot_at(Utc::now(), vec![Host::new("10.0.0.5").with_port(Port::open_tcp(53, "domain"))]);
        let b = snapshot_at(
            Utc::now(),
            vec![Host::new("10.0.0.5")
                .with_port(Port::open_tcp(53, "domain"))
                .with_port(Port::open_tcp(53, "domain").with_protocol(Protocol::Udp))],
        );
        let result = compare(&a, &b);
        assert_eq!(result.new_ports.len(), 1);
        assert_eq!(result.new_ports[0].protocol, Protocol::Udp);
    }

    #[test]
    fn duplicate_ip_last_entry_wins() {
        let a = snapshot_at(
            Utc::now(),
            vec![
                Host::new("10.0.0.5").with_port(Port::open_tcp(21, "ftp")),
                Host::new("10.0.0.5").with_port(Port::open_tcp(80, "http")),
            ],
        );
        let b = snapshot_at(Utc::now(), vec![Host::new("10.0.0.5").with_port(Port::open_tcp(80, "http"))]);
        assert!(compare(&a, &b).is_empty());
    }

    #[test]
    fn new_hosts_follow_snapshot_order() {
        let a = snapshot_at(Utc::now(), vec![]);
        let b = snapshot_at(
            Utc::now(),
            vec![Host::new("10.0.0.30"), Host::new("10.0.0.4"), Host::new("10.0.0.17")],
        );
        assert_eq!(compare(&a, &b).new_hosts, vec!["10.0.0.30", "10.0.0.4", "10.0.0.17"]);
    }

    #[test]
    fn missing_snapshot_is_invalid() {
        let a = monday();
        assert!(matches!(
            compare_snapshots(None, Some(&a)),
            Err(DiscoverError::InvalidSnapshot(_))
        ));
        assert!(matches!(
            compare_snapshots(Some(&a), None),
            Err(DiscoverError::InvalidSnapshot(_))
        ));
        assert!(compare_snapshots(Some(&a), Some(&a)).is_ok());
    }

    #[test]
    fn chronological_orders_by_start_time() {
        let (a, b) = (monday(), tuesday());
        let result = compare_chronological(&b, &a).unwrap();
        assert_eq!(result.older.id, a.id);
        assert_eq!(result.removed_hosts, vec!["10.0.0.9"]);
    }

    #[test]
    fn chronological_rejects_equal_start_times() {
        let a = monday();
        let mut b = tuesday();
        b.started_at = a.started_at;
        assert!(matches!(
            compare_chronological(&a, &b),
            Err(DiscoverError::AmbiguousOrder { .. })
        ));
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(TimeDelta::seconds(42)), "42s");
        assert_eq!(format_elapsed(TimeDelta::seconds(3_725)), "1h 2m 5s");
        assert_eq!(format_elapsed(TimeDelta::seconds(90_061)), "1d 1h 1m 1s");
        assert_eq!(format_elapsed(TimeDelta::seconds(-60)), "-1m 0s");
    }
}
