//! End-to-end: nmap XML reports through conversion, the snapshot store,
//! and comparison.

use chrono::{TimeDelta, Utc};
use vantage_discover::convert::snapshot_from_run;
use vantage_discover::diff::ChangeAction;
use vantage_discover::nmap_xml::parse_nmap_xml;
use vantage_discover::pipeline::record_snapshot;
use vantage_discover::{compare_chronological, compare_snapshots, DiscoverError};
use vantage_store::{FsSnapshotStore, SnapshotQuery, SnapshotStore};

const MONDAY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" args="nmap -T4 -sV -p 1-1000 -oX - 10.0.0.0/24" start="1760300000" version="7.94">
  <host>
    <status state="up"/>
    <address addr="10.0.0.5" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="80">
        <state state="open"/>
        <service name="http" product="nginx" version="1.24.0"/>
      </port>
    </ports>
  </host>
  <host>
    <status state="up"/>
    <address addr="10.0.0.9" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="445">
        <state state="open"/>
        <service name="microsoft-ds"/>
      </port>
    </ports>
  </host>
  <runstats><finished time="1760300040" elapsed="40.0"/></runstats>
</nmaprun>"#;

const TUESDAY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" args="nmap -T4 -sV -p 1-1000 -oX - 10.0.0.0/24" start="1760386400" version="7.94">
  <host>
    <status state="up"/>
    <address addr="10.0.0.5" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="22">
        <state state="open"/>
        <service name="ssh" product="OpenSSH" version="9.6"/>
      </port>
      <port protocol="tcp" portid="80">
        <state state="open"/>
        <service name="http" product="nginx" version="1.25.3"/>
      </port>
    </ports>
  </host>
  <runstats><finished time="1760386430" elapsed="30.0"/></runstats>
</nmaprun>"#;

fn snapshot(xml: &str) -> vantage_core::ScanSnapshot {
    let run = parse_nmap_xml(xml.as_bytes()).unwrap();
    let started = run.started_at().unwrap();
    let finished = run.finished_at().unwrap();
    snapshot_from_run("10.0.0.0/24", &run, started, finished)
}

#[test]
fn recorded_history_reports_removed_host_and_opened_port() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsSnapshotStore::new(dir.path()).unwrap();

    let first = record_snapshot(&store, snapshot(MONDAY_XML)).unwrap();
    assert!(first.changes.is_none());

    let second = record_snapshot(&store, snapshot(TUESDAY_XML)).unwrap();
    let changes = second.changes.expect("second scan is compared");

    assert!(changes.new_hosts.is_empty());
    assert_eq!(changes.removed_hosts, vec!["10.0.0.9"]);
    assert_eq!(changes.new_ports.len(), 1);
    assert_eq!(changes.new_ports[0].host, "10.0.0.5");
    assert_eq!(changes.new_ports[0].port, 22);
    assert_eq!(changes.new_ports[0].action, ChangeAction::Opened);
    // Version bump on port 80 is not a change.
    assert!(changes.closed_ports.is_empty());
    assert!(changes.summary.contains("Elapsed: 1d 0h 0m 0s"));

    let history = store.list(&SnapshotQuery::default()).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.stored.id());
}

#[test]
fn stored_snapshots_compare_in_either_argument_order_chronologically() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsSnapshotStore::new(dir.path()).unwrap();
    let monday = store.save(&snapshot(MONDAY_XML)).unwrap();
    let tuesday = store.save(&snapshot(TUESDAY_XML)).unwrap();

    let a = store.get(tuesday.id()).unwrap().snapshot;
    let b = store.get(monday.id()).unwrap().snapshot;
    let result = compare_chronological(&a, &b).unwrap();
    assert_eq!(result.older.id, monday.id());
    assert_eq!(result.removed_hosts, vec!["10.0.0.9"]);

    let reversed = compare_snapshots(Some(&a), Some(&b)).unwrap();
    assert_eq!(reversed.new_hosts, vec!["10.0.0.9"]);
    assert_eq!(reversed.closed_ports.len(), 1);
}

#[test]
fn equal_start_times_are_ambiguous() {
    let a = snapshot(MONDAY_XML);
    let mut b = snapshot(TUESDAY_XML);
    b.started_at = a.started_at;
    b.finished_at = a.started_at + TimeDelta::seconds(5);
    assert!(matches!(
        compare_chronological(&a, &b),
        Err(DiscoverError::AmbiguousOrder { .. })
    ));
    assert!(a.started_at < Utc::now());
}
