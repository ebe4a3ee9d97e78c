use std::collections::BTreeMap;

use proptest::prelude::*;
use routesnap_diff::{CompareOptions, compare_records};
use routesnap_ir::{NextHop, RouteProtocol, RouteRecord};

fn record(prefix: u8, hop: u8, metric: u32, protocol: RouteProtocol) -> RouteRecord {
    let mut record = RouteRecord::new(format!("10.{prefix}.0.0/16"))
        .expect("prefix")
        .with_next_hop(NextHop::parse(&format!("192.0.2.{hop}")).expect("next hop"))
        .with_metric(metric)
        .with_protocol(protocol);
    record.hostname = Some("pe1".to_string());
    record.service = Some("Base".to_string());
    record
}

fn protocol_strategy() -> impl Strategy<Value = RouteProtocol> {
    prop::sample::select(vec![RouteProtocol::Isis, RouteProtocol::Bgp, RouteProtocol::Static])
}

fn path_strategy() -> impl Strategy<Value = (u8, u8, u32, RouteProtocol)> {
    (0u8..8, 0u8..4, 0u32..3, protocol_strategy())
}

/// Arbitrary snapshot, multipath included.
fn snapshot_strategy() -> impl Strategy<Value = Vec<RouteRecord>> {
    prop::collection::vec(path_strategy(), 0..24).prop_map(|paths| {
        paths
            .into_iter()
            .map(|(prefix, hop, metric, protocol)| record(prefix, hop, metric, protocol))
            .collect()
    })
}

/// Snapshot with one path per prefix.
fn single_path_strategy() -> impl Strategy<Value = Vec<RouteRecord>> {
    prop::collection::vec(path_strategy(), 0..16).prop_map(|paths| {
        let unique: BTreeMap<u8, (u8, u32, RouteProtocol)> = paths
            .into_iter()
            .map(|(prefix, hop, metric, protocol)| (prefix, (hop, metric, protocol)))
            .collect();
        unique
            .into_iter()
            .map(|(prefix, (hop, metric, protocol))| record(prefix, hop, metric, protocol))
            .collect()
    })
}

proptest! {
    #[test]
    fn snapshot_compared_with_itself_is_empty(records in snapshot_strategy()) {
        for options in [CompareOptions::default(), CompareOptions::route_only()] {
            prop_assert!(compare_records(&records, &records, &options).is_empty());
        }
    }

    #[test]
    fn comparison_is_deterministic(left in snapshot_strategy(), right in snapshot_strategy()) {
        let options = CompareOptions::default();
        prop_assert_eq!(
            compare_records(&left, &right, &options),
            compare_records(&left, &right, &options)
        );
    }

    #[test]
    fn reversing_direction_swaps_sections(left in single_path_strategy(), right in single_path_strategy()) {
        let options = CompareOptions::default();
        let forward = compare_records(&left, &right, &options);
        let backward = compare_records(&right, &left, &options);
        prop_assert_eq!(forward.swap(), backward);
    }

    #[test]
    fn every_record_lands_somewhere(left in snapshot_strategy(), right in snapshot_strategy()) {
        let result = compare_records(&left, &right, &CompareOptions::default());
        for removed in &result.deleted {
            prop_assert!(!right.iter().any(|r| r.prefix == removed.prefix));
        }
        for added in &result.added {
            prop_assert!(!left.iter().any(|r| r.prefix == added.prefix));
        }
        for change in &result.changed {
            prop_assert!(left.iter().any(|r| r.prefix == change.route));
            prop_assert!(right.iter().any(|r| r.prefix == change.route));
        }
    }
}
