//! End-to-end suggestion runs against a catalog file on disk.

use std::collections::HashSet;
use std::fs;

use chrono::Utc;
use vantage_core::types::{Host, Port, ScanSnapshot};
use vantage_exploit::rank::rank_order;
use vantage_exploit::{ExploitAdvisor, SuggestConfig, SuggestError};

const CATALOG: &str = r#"{
    "exploit/windows/smb/ms17_010_eternalblue": {"rank": "excellent", "description": "EternalBlue"},
    "exploit/windows/smb/ms08_067_netapi": {"rank": 500, "description": "MS08-067 Server Service Relative Path Stack Corruption"},
    "exploit/linux/samba/is_known_pipename": {"rank": "excellent", "description": "SambaCry"},
    "exploit/multi/samba/usermap_script": {"rank": "excellent", "description": "Samba username map script"},
    "exploit/multi/http/struts_rce": {"rank": "great", "description": "Apache Struts RCE"},
    "exploit/unix/webapp/drupal_drupalgeddon2": {"rank": "excellent", "description": "Drupalgeddon 2"},
    "exploit/linux/misc/http_daemon_x": {"rank": "excellent", "description": "Not a web module"},
    "exploit/windows/browser/ms10_002_aurora": {"rank": "normal", "description": "Aurora"},
    "exploit/unix/ftp/vsftpd_234_backdoor": {"rank": "excellent", "description": "VSFTPD v2.3.4 Backdoor"},
    "exploit/unix/ftp/proftpd_133c_backdoor": {"rank": "excellent"},
    "auxiliary/scanner/smb/smb_version": {"rank": "normal"}
}"#;

fn advisor_with_catalog(dir: &tempfile::TempDir) -> ExploitAdvisor {
    let path = dir.path().join("modules_metadata.json");
    fs::write(&path, CATALOG).unwrap();
    ExploitAdvisor::with_config(SuggestConfig {
        catalog_path: path.display().to_string(),
        ..Default::default()
    })
}

fn snapshot(hosts: Vec<Host>) -> ScanSnapshot {
    let now = Utc::now();
    ScanSnapshot::new("10.0.0.0/24", now, now, hosts)
}

#[test]
fn eternalblue_only_for_windows_host() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_with_catalog(&dir);

    let windows = snapshot(vec![Host::new("10.0.0.20")
        .with_os("Windows Server 2012")
        .with_port(Port::open_tcp(445, "smb"))]);
    let result = advisor.suggest(&windows).unwrap();
    let eternalblue = result
        .iter()
        .find(|s| s.module_name == "exploit/windows/smb/ms17_010_eternalblue")
        .expect("EternalBlue suggested for Windows");
    assert_eq!(eternalblue.rank, "excellent");
    assert!(result.iter().all(|s| !s.module_name.contains("linux/")));

    let linux = snapshot(vec![Host::new("10.0.0.21")
        .with_os("Linux")
        .with_port(Port::open_tcp(445, "smb"))]);
    let result = advisor.suggest(&linux).unwrap();
    assert!(result.iter().all(|s| !s.module_name.contains("windows/")));
}

#[test]
fn http_services_require_web_path_segment() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_with_catalog(&dir);
    let snap = snapshot(vec![Host::new("10.0.0.5")
        .with_port(Port::open_tcp(80, "http"))
        .with_port(Port::open_tcp(443, "https"))]);

    let names: Vec<String> = advisor
        .suggest(&snap)
        .unwrap()
        .into_iter()
        .map(|s| s.module_name)
        .collect();
    assert_eq!(
        names,
        vec![
            "exploit/unix/webapp/drupal_drupalgeddon2",
            "exploit/multi/http/struts_rce",
        ]
    );
}

#[test]
fn output_properties_hold_for_mixed_network() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_with_catalog(&dir);
    let snap = snapshot(vec![
        Host::new("10.0.0.20")
            .with_os("Microsoft Windows 7")
            .with_port(Port::open_tcp(445, "smb"))
            .with_port(Port::open_tcp(80, "http")),
        Host::new("10.0.0.30")
            .with_os("Linux 3.2")
            .with_port(Port::open_tcp(21, "ftp").with_version("vsftpd 2.3.4"))
            .with_port(Port::open_tcp(139, "samba")),
    ]);

    let result = advisor.suggest(&snap).unwrap();
    assert!(!result.is_empty());
    assert!(result.len() <= advisor.config().max_results);

    let unique: HashSet<&str> = result.iter().map(|s| s.module_name.as_str()).collect();
    assert_eq!(unique.len(), result.len());

    for pair in result.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let key_a = (rank_order(&a.rank), a.module_name.as_str());
        let key_b = (rank_order(&b.rank), b.module_name.as_str());
        assert!(key_a <= key_b, "{key_a:?} sorted after {key_b:?}");
    }

    // Numeric framework rank mapped to its label.
    let netapi = result
        .iter()
        .find(|s| s.module_name == "exploit/windows/smb/ms08_067_netapi")
        .unwrap();
    assert_eq!(netapi.rank, "great");

    // Denylisted family never appears.
    assert!(result.iter().all(|s| !s.module_name.contains("/browser/")));

    let proftpd = result
        .iter()
        .find(|s| s.module_name == "exploit/unix/ftp/proftpd_133c_backdoor")
        .unwrap();
    assert_eq!(proftpd.description, "N/A");
}

#[test]
fn corrupt_catalog_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modules_metadata.json");
    fs::write(&path, "[]").unwrap();
    let advisor = ExploitAdvisor::with_config(SuggestConfig {
        catalog_path: path.display().to_string(),
        ..Default::default()
    });
    let snap = snapshot(vec![Host::new("10.0.0.5").with_port(Port::open_tcp(21, "ftp"))]);
    assert!(matches!(
        advisor.suggest(&snap),
        Err(SuggestError::CatalogCorrupt { .. })
    ));
}
