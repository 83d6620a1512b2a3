//! Nmap XML report model.
//!
//! nmap writes its report with `-oX -`; these structs mirror the subset of
//! that document Vantage reads, deserialized through `quick-xml`'s serde
//! support. Everything below `<nmaprun>` is optional in practice, so most
//! fields are `Option` or default to empty.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Root element: `<nmaprun>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "nmaprun")]
pub struct NmapRun {
    #[serde(rename = "@args")]
    pub args: Option<String>,
    /// Scan start as Unix seconds.
    #[serde(rename = "@start")]
    pub start: Option<i64>,
    #[serde(rename = "@version")]
    pub version: Option<String>,
    #[serde(rename = "host", default)]
    pub hosts: Vec<NmapHost>,
    pub runstats: Option<RunStats>,
}

impl NmapRun {
    /// Start time recorded by nmap, if present and valid.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    /// Finish time from `<runstats><finished time=..>`, if present and valid.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.runstats
            .as_ref()
            .and_then(|r| r.finished.as_ref())
            .and_then(|f| f.time)
            .and_then(|t| DateTime::from_timestamp(t, 0))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapHost {
    pub status: Option<NmapStatus>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<NmapAddress>,
    pub hostnames: Option<NmapHostnames>,
    pub ports: Option<NmapPorts>,
    pub os: Option<NmapOs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapStatus {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapAddress {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapHostnames {
    #[serde(rename = "hostname", default)]
    pub names: Vec<NmapHostname>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapHostname {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapPorts {
    #[serde(rename = "port", default)]
    pub ports: Vec<NmapPort>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapPort {
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@portid")]
    pub port_id: u16,
    pub state: NmapPortState,
    pub service: Option<NmapService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapPortState {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapService {
    #[serde(rename = "@name")]
    pub name: Option<String>,
    #[serde(rename = "@product")]
    pub product: Option<String>,
    #[serde(rename = "@version")]
    pub version: Option<String>,
}

impl NmapService {
    /// Product and version joined by a space, skipping missing or empty
    /// parts. `None` when both are absent.
    pub fn version_string(&self) -> Option<String> {
        let parts: Vec<&str> = [self.product.as_deref(), self.version.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapOs {
    #[serde(rename = "osmatch", default)]
    pub matches: Vec<NmapOsMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapOsMatch {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@accuracy")]
    pub accuracy: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunStats {
    pub finished: Option<Finished>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Finished {
    #[serde(rename = "@time")]
    pub time: Option<i64>,
    #[serde(rename = "@elapsed")]
    pub elapsed: Option<f64>,
}

impl NmapHost {
    /// The address used as the host key: IPv4 when present, otherwise the
    /// first non-MAC address listed.
    pub fn primary_address(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == "ipv4")
            .or_else(|| self.addresses.iter().find(|a| a.addr_type != "mac"))
            .map(|a| a.addr.as_str())
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostnames
            .as_ref()
            .and_then(|hn| hn.names.first())
            .map(|h| h.name.as_str())
    }

    pub fn state(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.state.as_str())
    }

    /// First OS match, which nmap lists with the highest accuracy first.
    pub fn os_name(&self) -> Option<&str> {
        self.os
            .as_ref()
            .and_then(|os| os.matches.first())
            .map(|m| m.name.as_str())
    }

    pub fn ports(&self) -> &[NmapPort] {
        self.ports.as_ref().map(|p| p.ports.as_slice()).unwrap_or(&[])
    }
}

/// Parse nmap XML bytes into a structured [`NmapRun`].
pub fn parse_nmap_xml(xml: &[u8]) -> Result<NmapRun> {
    quick_xml::de::from_reader(xml).map_err(|e| DiscoverError::XmlParse(e.to_string()))
}


#[cfg(test)]
mod tests {
    use super::fixtures::OFFICE_SCAN_XML;
    use super::*;

    #[test]
    fn parses_hosts_and_timestamps() {
        let run = parse_nmap_xml(OFFICE_SCAN_XML.as_bytes()).unwrap();
        assert_eq!(run.hosts.len(), 2);
        assert_eq!(run.version.as_deref(), Some("7.94"));
        assert_eq!(run.started_at().unwrap().timestamp(), 1_760_000_000);
        assert_eq!(run.finished_at().unwrap().timestamp(), 1_760_000_125);
    }

    #[test]
    fn parses_ports_and_services() {
        let run = parse_nmap_xml(OFFICE_SCAN_XML.as_bytes()).unwrap();
        let web = &run.hosts[0];
        assert_eq!(web.primary_address(), Some("192.168.56.10"));
        assert_eq!(web.hostname(), Some("intranet.lab"));
        assert_eq!(web.state(), Some("up"));
        assert_eq!(web.os_name(), Some("Linux 4.15 - 5.8"));

        let ports = web.ports();
        assert_eq!(ports.len(), 3);
        let http = &ports[1];
        assert_eq!(http.port_id, 80);
        assert_eq!(
            http.service.as_ref().and_then(|s| s.version_string()).as_deref(),
            Some("Apache httpd 2.4.49")
        );
        assert!(ports[2].service.is_none());

        let smb = &run.hosts[1];
        assert_eq!(smb.os_name(), Some("Microsoft Windows 10 1709 - 1909"));
        assert_eq!(smb.ports()[1].protocol, "udp");
        assert_eq!(smb.ports()[1].state.state, "open|filtered");
    }

    #[test]
    fn empty_run_has_no_hosts() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" args="nmap -sV 203.0.113.0/30" start="1760000000">
  <runstats>
    <finished time="1760000003" elapsed="3.01"/>
  </runstats>
</nmaprun>"#;
        let run = parse_nmap_xml(xml.as_bytes()).unwrap();
        assert!(run.hosts.is_empty());
        assert!(run.finished_at().is_some());
    }

    #[test]
    fn ipv6_only_host_uses_first_address() {
        let host = NmapHost {
            status: None,
            addresses: vec![
                NmapAddress {
                    addr: "02:42:AC:11:00:02".to_string(),
                    addr_type: "mac".to_string(),
                },
                NmapAddress {
                    addr: "fe80::42:acff:fe11:2".to_string(),
                    addr_type: "ipv6".to_string(),
                },
            ],
            hostnames: None,
            ports: None,
            os: None,
        };
        assert_eq!(host.primary_address(), Some("fe80::42:acff:fe11:2"));
        assert!(host.ports().is_empty());
        assert_eq!(host.os_name(), None);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let result = parse_nmap_xml(b"<nmaprun><host>");
        assert!(matches!(result, Err(DiscoverError::XmlParse(_))));
    }

    #[test]
    fn version_string_skips_missing_parts() {
        let svc = NmapService {
            name: Some("ssh".to_string()),
            product: None,
            version: Some("9.6".to_string()),
        };
        assert_eq!(svc.version_string().as_deref(), Some("9.6"));
        let bare = NmapService {
            name: Some("ssh".to_string()),
            product: None,
            version: None,
        };
        assert_eq!(bare.version_string(), None);
    }
}
