use routesnap_ir::{NextHop, RouteProtocol, RouteRecord, Timestamp};
use routesnap_store::{MemoryStore, SnapshotKey, SnapshotStore};

use super::{
    CSV_HEADER, CompareOptions, ComparisonResult, IdentityField, compare, compare_records,
    format_csv_report, format_csv_rows, format_text_report, identity_key,
};

fn hop(text: &str) -> NextHop {
    NextHop::parse(text).expect("next hop")
}

fn route(prefix: &str, next_hop: &str, metric: u32) -> RouteRecord {
    let mut record = RouteRecord::new(prefix)
        .expect("prefix")
        .with_protocol(RouteProtocol::Isis)
        .with_next_hop(hop(next_hop))
        .with_metric(metric);
    record.hostname = Some("pe1".to_string());
    record.service = Some("Base".to_string());
    record
}

fn ts(text: &str) -> Timestamp {
    Timestamp::parse(text).expect("timestamp")
}

fn seeded_store(snapshots: &[(&str, Vec<RouteRecord>)]) -> MemoryStore {
    let store = MemoryStore::new();
    for (timestamp, records) in snapshots {
        let key = SnapshotKey::new("pe1", "Base", ts(timestamp));
        store.save_snapshot(&key, records).expect("save");
    }
    store
}

#[test]
fn next_hop_change_is_reported_as_changed() {
    let store = seeded_store(&[
        ("2024-05-09_08:30", vec![route("10.0.0.0/24", "10.10.10.1", 50)]),
        ("2024-05-10_08:30", vec![route("10.0.0.0/24", "10.10.20.1", 50)]),
    ]);

    let result = compare(
        &store,
        "pe1",
        "Base",
        &ts("2024-05-09_08:30"),
        &ts("2024-05-10_08:30"),
        &CompareOptions::default(),
    )
    .expect("compare");

    assert!(result.added.is_empty());
    assert!(result.deleted.is_empty());
    assert_eq!(result.changed.len(), 1);
    let change = &result.changed[0];
    assert_eq!(change.route, "10.0.0.0/24");
    assert_eq!(change.next_hop_before, Some(hop("10.10.10.1")));
    assert_eq!(change.next_hop_after, Some(hop("10.10.20.1")));
    assert_eq!(change.metric_before, Some(50));
    assert_eq!(change.metric_after, Some(50));
    assert!(change.next_hop_changed());
    assert!(!change.metric_changed());
    assert!(!change.path_removed);
}

#[test]
fn added_and_deleted_are_the_key_difference() {
    let a = route("1.1.1.10/32", "10.0.0.1", 10);
    let b = route("2.2.2.20/32", "10.0.0.1", 10);
    let c = route("3.3.3.30/32", "10.0.0.1", 10);

    let result = compare_records(
        &[a.clone(), b.clone()],
        &[b, c.clone()],
        &CompareOptions::default(),
    );

    assert_eq!(result.added, vec![c]);
    assert_eq!(result.deleted, vec![a]);
    assert!(result.changed.is_empty());
}

#[test]
fn snapshot_compared_with_itself_is_empty() {
    let records = vec![
        route("10.0.0.0/24", "10.10.10.1", 50),
        route("10.20.0.0/16", "10.1.0.1", 20),
        route("10.20.0.0/16", "10.1.0.5", 20),
    ];
    let store = seeded_store(&[("2024-05-09_08:30", records)]);
    let t = ts("2024-05-09_08:30");

    let result = compare(&store, "pe1", "Base", &t, &t, &CompareOptions::default()).expect("compare");
    assert!(result.is_empty());
}

#[test]
fn missing_snapshot_yields_empty_result() {
    let store = seeded_store(&[("2024-05-09_08:30", vec![route("10.0.0.0/24", "10.10.10.1", 50)])]);

    let result = compare(
        &store,
        "pe1",
        "Base",
        &ts("2024-05-09_08:30"),
        &ts("2024-05-11_08:30"),
        &CompareOptions::default(),
    )
    .expect("compare");
    assert_eq!(result, ComparisonResult::default());
}

#[test]
fn reversed_direction_swaps_sections() {
    let before = vec![
        route("1.1.1.10/32", "10.0.0.1", 10),
        route("10.0.0.0/24", "10.10.10.1", 50),
    ];
    let after = vec![
        route("10.0.0.0/24", "10.10.20.1", 60),
        route("3.3.3.30/32", "10.0.0.1", 10),
    ];
    let options = CompareOptions::default();

    let forward = compare_records(&before, &after, &options);
    let backward = compare_records(&after, &before, &options);
    assert_eq!(forward.clone().swap(), backward);
    assert_eq!(backward.swap(), forward);
}

#[test]
fn removed_multipath_leg_is_flagged() {
    let before = vec![
        route("10.20.0.0/16", "10.1.0.1", 20),
        route("10.20.0.0/16", "10.1.0.5", 20),
    ];
    let after = vec![route("10.20.0.0/16", "10.1.0.1", 20)];

    let result = compare_records(&before, &after, &CompareOptions::default());
    assert!(result.added.is_empty());
    assert!(result.deleted.is_empty());
    assert_eq!(result.changed.len(), 1);
    let change = &result.changed[0];
    assert!(change.path_removed);
    assert_eq!(change.next_hop_before, Some(hop("10.1.0.5")));
    assert_eq!(change.next_hop_after, None);
}

#[test]
fn added_multipath_leg_is_unreported() {
    let before = vec![route("10.20.0.0/16", "10.1.0.1", 20)];
    let after = vec![
        route("10.20.0.0/16", "10.1.0.1", 20),
        route("10.20.0.0/16", "10.1.0.5", 20),
    ];

    let result = compare_records(&before, &after, &CompareOptions::default());
    assert!(result.is_empty());
}

#[test]
fn next_hop_identity_moves_changes_into_added_and_deleted() {
    let before = vec![route("10.0.0.0/24", "10.10.10.1", 50)];
    let after = vec![route("10.0.0.0/24", "10.10.20.1", 50)];
    let options = CompareOptions::default().with_field(IdentityField::NextHop);

    let result = compare_records(&before, &after, &options);
    assert_eq!(result.added.len(), 1);
    assert_eq!(result.deleted.len(), 1);
    assert_eq!(result.changed.len(), 1);
}

#[test]
fn route_only_identity_ignores_service() {
    let before = vec![route("10.0.0.0/24", "10.10.10.1", 50)];
    let mut moved = route("10.0.0.0/24", "10.10.10.1", 50);
    moved.service = Some("99".to_string());

    let default = compare_records(&before, std::slice::from_ref(&moved), &CompareOptions::default());
    assert_eq!(default.added.len(), 1);
    assert_eq!(default.deleted.len(), 1);

    let route_only = compare_records(&before, &[moved], &CompareOptions::route_only());
    assert!(route_only.is_empty());
}

#[test]
fn identity_fields_are_sorted_and_deduplicated() {
    let options = CompareOptions::new([
        IdentityField::Route,
        IdentityField::Hostname,
        IdentityField::Route,
    ]);
    assert_eq!(
        options.fields(),
        &[IdentityField::Hostname, IdentityField::Route]
    );
    assert_eq!(CompareOptions::new(Vec::<IdentityField>::new()).fields(), &[IdentityField::Route]);
    assert_eq!("next-hop".parse::<IdentityField>(), Ok(IdentityField::NextHop));
    assert!("weight".parse::<IdentityField>().is_err());
}

#[test]
fn identity_key_ignores_non_identity_fields() {
    let options = CompareOptions::default();
    let a = route("10.0.0.0/24", "10.10.10.1", 50);
    let b = route("10.0.0.0/24", "10.10.20.1", 70);
    let c = route("10.0.0.1/32", "10.10.10.1", 50);
    assert_eq!(identity_key(&a, &options), identity_key(&b, &options));
    assert_ne!(identity_key(&a, &options), identity_key(&c, &options));
}

#[test]
fn text_report_lists_sections() {
    let before = vec![
        route("1.1.1.10/32", "10.0.0.1", 10),
        route("10.0.0.0/24", "10.10.10.1", 50),
    ];
    let after = vec![
        route("10.0.0.0/24", "10.10.20.1", 50),
        route("3.3.3.30/32", "10.0.0.1", 10),
    ];
    let result = compare_records(&before, &after, &CompareOptions::default());

    let report = format_text_report(&result, "2024-05-09_08:30", "2024-05-10_08:30");
    assert!(report.starts_with(&"#".repeat(80)));
    assert!(report.contains("HOSTNAME: pe1\n"));
    assert!(report.contains("SERVICE: Base\n"));
    assert!(report.contains("Added routes:\n+ 3.3.3.30/32\n"));
    assert!(report.contains("Deleted routes:\n- 1.1.1.10/32\n"));
    assert!(report.contains("~ 10.0.0.0/24\n  Next hop: 10.10.10.1 -> 10.10.20.1\n"));
    assert!(!report.contains("Metric:"));
    assert!(report.contains("Summary: 1 added, 1 deleted, 1 modified\n"));
}

#[test]
fn text_report_for_no_changes() {
    let report = format_text_report(&ComparisonResult::default(), "a", "b");
    assert!(report.contains("No changes detected.\n"));
    assert!(!report.contains("HOSTNAME:"));
}

#[test]
fn csv_report_rows() {
    let before = vec![route("10.0.0.0/24", "10.10.10.1", 50)];
    let after = vec![
        route("10.0.0.0/24", "10.10.10.1", 70),
        route("3.3.3.30/32", "10.0.0.1", 10),
    ];
    let result = compare_records(&before, &after, &CompareOptions::default());

    let csv = format_csv_report(&result);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], "+added,pe1,Base,3.3.3.30/32,ISIS,10.0.0.1,10");
    assert_eq!(
        lines[2],
        "~modified,pe1,Base,10.0.0.0/24,ISIS -> ISIS,10.10.10.1 -> 10.10.10.1,50 -> 70"
    );
    assert!(csv.ends_with("\n\n"));

    let rows = format_csv_rows(&result);
    assert!(!rows.contains(CSV_HEADER));
    assert_eq!(rows.lines().count(), 2);
    assert_eq!(csv, format!("{CSV_HEADER}\n{rows}\n"));
}
