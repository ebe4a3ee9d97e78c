use routesnap_ir::{NextHop, RouteProtocol, RouteRecord, Timestamp};
use routesnap_store::{MemoryStore, SnapshotKey, SnapshotStore, SqliteStore, StoreError};
use tempfile::TempDir;

fn ts(text: &str) -> Timestamp {
    Timestamp::parse(text).expect("timestamp")
}

fn route(prefix: &str, next_hop: &str, metric: u32) -> RouteRecord {
    RouteRecord::new(prefix)
        .expect("prefix")
        .with_protocol(RouteProtocol::Isis)
        .with_next_hop(NextHop::parse(next_hop).expect("next hop"))
        .with_metric(metric)
}

fn stores(dir: &TempDir) -> Vec<(&'static str, Box<dyn SnapshotStore>)> {
    let sqlite = SqliteStore::open(dir.path().join("routes.sqlite3")).expect("sqlite store");
    vec![
        ("sqlite", Box::new(sqlite)),
        ("memory", Box::new(MemoryStore::new())),
    ]
}

#[test]
fn multipath_records_are_preserved() {
    let dir = TempDir::new().expect("tempdir");
    for (name, store) in stores(&dir) {
        let key = SnapshotKey::new("pe1", "Base", ts("2024-05-09_08:30"));
        let paths = vec![
            route("10.20.0.0/16", "10.1.0.1", 20),
            route("10.20.0.0/16", "10.1.0.5", 20),
            route("10.20.0.0/16", "10.1.0.9", 20),
        ];
        assert_eq!(store.save_snapshot(&key, &paths).expect("save"), 3, "{name}");

        let loaded = store.load_snapshot(&key).expect("load").expect("present");
        assert_eq!(loaded.len(), 3, "{name}");
        let hops: Vec<String> = loaded
            .iter()
            .filter_map(|r| r.next_hop.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(hops, vec!["10.1.0.1", "10.1.0.5", "10.1.0.9"], "{name}");
        assert!(
            loaded
                .iter()
                .all(|r| r.hostname.as_deref() == Some("pe1") && r.service.as_deref() == Some("Base")),
            "{name}"
        );
    }
}

#[test]
fn rewriting_an_existing_key_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    for (name, store) in stores(&dir) {
        let key = SnapshotKey::new("pe1", "Base", ts("2024-05-09_08:30"));
        store
            .save_snapshot(&key, &[route("1.1.1.10/32", "10.0.0.1", 1)])
            .expect("save");
        let err = store
            .save_snapshot(&key, &[route("2.2.2.20/32", "10.0.0.1", 1)])
            .expect_err("duplicate key");
        assert!(matches!(err, StoreError::SnapshotExists(_)), "{name}: {err}");

        let loaded = store.load_snapshot(&key).expect("load").expect("present");
        assert_eq!(loaded.len(), 1, "{name}");
        assert_eq!(loaded[0].prefix, "1.1.1.10/32", "{name}");
    }
}

#[test]
fn listing_and_removal() {
    let dir = TempDir::new().expect("tempdir");
    for (name, store) in stores(&dir) {
        let early = ts("2024-05-09_08:30");
        let late = ts("2024-05-10_08:30");
        let base_early = SnapshotKey::new("pe1", "Base", early.clone());
        let vprn_early = SnapshotKey::new("pe1", "99", early.clone());
        let base_late = SnapshotKey::new("pe1", "Base", late.clone());
        let other = SnapshotKey::new("pe2", "Base", late.clone());

        store
            .save_snapshot(&base_early, &[route("1.1.1.10/32", "10.0.0.1", 1), route("2.2.2.20/32", "10.0.0.1", 1)])
            .expect("save");
        store
            .save_snapshot(&vprn_early, &[route("10.9.0.0/16", "10.0.0.2", 5)])
            .expect("save");
        store.save_snapshot(&base_late, &[]).expect("save");
        store.save_snapshot(&other, &[]).expect("save");

        assert_eq!(
            store.list_snapshots(None).expect("list"),
            vec![base_late.clone(), other.clone(), vprn_early.clone(), base_early.clone()],
            "{name}"
        );
        assert_eq!(
            store.list_snapshots(Some("pe2")).expect("list"),
            vec![other.clone()],
            "{name}"
        );

        assert_eq!(store.remove_snapshot("pe1", &early).expect("remove"), 3, "{name}");
        assert!(!store.snapshot_exists(&base_early).expect("exists"), "{name}");
        assert!(!store.snapshot_exists(&vprn_early).expect("exists"), "{name}");
        assert!(store.snapshot_exists(&base_late).expect("exists"), "{name}");
        assert_eq!(store.remove_snapshot("pe1", &early).expect("remove"), 0, "{name}");
    }
}

#[test]
fn sqlite_snapshots_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("routes.sqlite3");
    let key = SnapshotKey::new("pe1", "Base", ts("2024-05-09_08:30"));

    let store = SqliteStore::open(&path).expect("open");
    store
        .save_snapshot(&key, &[route("10.0.0.0/24", "10.10.10.1", 50)])
        .expect("save");
    store.close().expect("close");

    let reopened = SqliteStore::open(&path).expect("reopen");
    let loaded = reopened.load_snapshot(&key).expect("load").expect("present");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].metric, Some(50));
    assert_eq!(loaded[0].timestamp.as_ref(), Some(&key.timestamp));
}
