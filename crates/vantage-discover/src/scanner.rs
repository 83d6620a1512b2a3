//! Nmap process wrapper.
//!
//! Runs nmap as a child process through `tokio::process::Command` with XML
//! written to stdout, then parses the report.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use tokio::process::Command;

use crate::config::ScanProfile;
use crate::error::{DiscoverError, Result};
use crate::nmap_xml::{self, NmapRun};

/// Raw output of one nmap invocation.
#[derive(Debug, Clone)]
pub struct NmapScanOutput {
    pub target: String,
    pub profile: ScanProfile,
    pub nmap_run: NmapRun,
    /// Local clock when the process was spawned.
    pub started_at: DateTime<Utc>,
    /// Local clock when the process exited.
    pub finished_at: DateTime<Utc>,
}

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
    os_detection: bool,
}

impl NmapScanner {
    pub fn new(nmap_path: &str) -> Self {
        Self {
            nmap_path: nmap_path.to_string(),
            os_detection: false,
        }
    }

    /// Request OS fingerprinting (`-O`) for non-loopback targets.
    pub fn with_os_detection(mut self, enabled: bool) -> Self {
        self.os_detection = enabled;
        self
    }

    /// Verify nmap is installed and return its version banner.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        let banner = String::from_utf8_lossy(&output.stdout);
        Ok(banner.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Full argument list for scanning `target` with `profile`.
    pub fn build_args(&self, target: &str, profile: ScanProfile) -> Vec<String> {
        let mut args: Vec<String> = profile.nmap_flags().into_iter().map(String::from).collect();
        if self.os_detection && !is_localhost(target) {
            args.push("-O".to_string());
        }
        args.extend(["-oX", "-", "--noninteractive"].map(String::from));
        args.push(target.to_string());
        args
    }

    /// Execute an nmap scan against `target` with the given profile.
    pub async fn scan(&self, target: &str, profile: ScanProfile) -> Result<NmapScanOutput> {
        let args = self.build_args(target, profile);
        let started_at = Utc::now();

        tracing::info!(
            target = %target,
            profile = ?profile,
            args = %args.join(" "),
            "Starting nmap scan"
        );

        let output = Command::new(&self.nmap_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                tracing::error!(path = %self.nmap_path, error = %e, "Failed to spawn nmap");
                DiscoverError::NmapNotFound {
                    path: self.nmap_path.clone(),
                }
            })?;

        let finished_at = Utc::now();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DiscoverError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let nmap_run = nmap_xml::parse_nmap_xml(&output.stdout)?;

        tracing::info!(
            target = %target,
            hosts = nmap_run.hosts.len(),
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "Nmap scan complete"
        );

        Ok(NmapScanOutput {
            target: target.to_string(),
            profile,
            nmap_run,
            started_at,
            finished_at,
        })
    }
}

/// Whether the target names the local machine: `localhost`, a loopback
/// address, or a loopback network.
pub fn is_localhost(target: &str) -> bool {
    let target = target.trim();
    if target.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if let Ok(ip) = target.parse::<IpAddr>() {
        return ip.is_loopback();
    }
    if let Ok(net) = target.parse::<IpNet>() {
        return net.addr().is_loopback();
    }
    false
}
