//! Normalized matching context for one host/port pair.

use vantage_core::types::{Host, Port};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// Lowercased OS string, empty when the scanner did not detect one.
    pub os: String,
    /// Lowercased service name.
    pub service: String,
    pub port: u16,
}

pub fn build_context(host: &Host, port: &Port) -> HostContext {
    HostContext {
        os: host.os.as_deref().unwrap_or_default().to_lowercase(),
        service: port.service.trim().to_lowercase(),
        port: port.number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_lowercased() {
        let host = Host::new("10.0.0.20").with_os("Windows Server 2012 R2");
        let port = Port::open_tcp(445, "SMB");
        let ctx = build_context(&host, &port);
        assert_eq!(ctx.os, "windows server 2012 r2");
        assert_eq!(ctx.service, "smb");
        assert_eq!(ctx.port, 445);
    }

    #[test]
    fn test_missing_os_is_empty() {
        let ctx = build_context(&Host::new("10.0.0.5"), &Port::open_tcp(22, "ssh"));
        assert_eq!(ctx.os, "");
        assert_eq!(ctx, build_context(&Host::new("10.0.0.5"), &Port::open_tcp(22, "ssh")));
    }
}
