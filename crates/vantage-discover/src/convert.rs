//! Conversion from nmap reports to [`ScanSnapshot`]s.

use chrono::{DateTime, Utc};
use vantage_core::types::{Host, HostStatus, Port, PortState, Protocol, ScanSnapshot};

use crate::nmap_xml::{NmapHost, NmapPort, NmapRun};
use crate::scanner::NmapScanOutput;

/// Build a snapshot from a finished scanner invocation.
pub fn snapshot_from_output(output: &NmapScanOutput) -> ScanSnapshot {
    snapshot_from_run(
        &output.target,
        &output.nmap_run,
        output.started_at,
        output.finished_at,
    )
}

/// Build a snapshot from a parsed report.
///
/// Hosts keep nmap's order. Hosts without any usable address are dropped.
/// Every port nmap reported is kept, whatever its state.
pub fn snapshot_from_run(
    target: &str,
    run: &NmapRun,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> ScanSnapshot {
    let hosts: Vec<Host> = run.hosts.iter().filter_map(convert_host).collect();
    let dropped = run.hosts.len() - hosts.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Skipped hosts without an address");
    }
    ScanSnapshot::new(target, started_at, finished_at, hosts)
}

fn convert_host(nmap_host: &NmapHost) -> Option<Host> {
    let ip = nmap_host.primary_address()?;
    Some(Host {
        ip: ip.to_string(),
        hostname: nmap_host.hostname().map(String::from),
        status: nmap_host
            .state()
            .map(HostStatus::parse)
            .unwrap_or(HostStatus::Unknown),
        os: nmap_host.os_name().map(String::from),
        ports: nmap_host.ports().iter().map(convert_port).collect(),
    })
}

fn convert_port(np: &NmapPort) -> Port {
    let service = np.service.as_ref();
    Port {
        number: np.port_id,
        protocol: Protocol::parse(&np.protocol),
        state: PortState::parse(&np.state.state),
        service: service
            .and_then(|s| s.name.clone())
            .unwrap_or_default(),
        version: service.and_then(|s| s.version_string()),
    }
}
