use std::collections::{BTreeMap, BTreeSet, HashSet};

use routesnap_ir::{NextHop, RouteProtocol, RouteRecord};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::model::{ChangeRecord, CompareOptions, ComparisonResult, IdentityField};

type PathTriple<'a> = (Option<&'a NextHop>, Option<u32>, Option<RouteProtocol>);

/// Stable identity digest of `record` under `options`.
pub fn identity_key(record: &RouteRecord, options: &CompareOptions) -> u64 {
    let mut canonical = String::new();
    for field in options.fields() {
        canonical.push_str(field.as_str());
        canonical.push('=');
        match field {
            IdentityField::Hostname => canonical.push_str(record.hostname.as_deref().unwrap_or("")),
            IdentityField::Service => canonical.push_str(record.service.as_deref().unwrap_or("")),
            IdentityField::Route => canonical.push_str(&record.prefix),
            IdentityField::NextHop => {
                if let Some(next_hop) = &record.next_hop {
                    canonical.push_str(&next_hop.to_string());
                }
            }
            IdentityField::Protocol => {
                if let Some(protocol) = record.route_protocol {
                    canonical.push_str(protocol.as_str());
                }
            }
        }
        canonical.push('|');
    }
    xxh3_64(canonical.as_bytes())
}

/// Compare two record lists. `left` is the older snapshot.
pub fn compare_records(
    left: &[RouteRecord],
    right: &[RouteRecord],
    options: &CompareOptions,
) -> ComparisonResult {
    let left_keys: HashSet<u64> = left.iter().map(|r| identity_key(r, options)).collect();
    let right_keys: HashSet<u64> = right.iter().map(|r| identity_key(r, options)).collect();

    let added: Vec<RouteRecord> = right
        .iter()
        .filter(|r| !left_keys.contains(&identity_key(r, options)))
        .cloned()
        .collect();
    let deleted: Vec<RouteRecord> = left
        .iter()
        .filter(|r| !right_keys.contains(&identity_key(r, options)))
        .cloned()
        .collect();
    let changed = changed_paths(left, right);

    debug!(
        added = added.len(),
        deleted = deleted.len(),
        changed = changed.len(),
        "snapshots compared"
    );
    ComparisonResult {
        added,
        deleted,
        changed,
    }
}

fn triple(record: &RouteRecord) -> PathTriple<'_> {
    (record.next_hop.as_ref(), record.metric, record.route_protocol)
}

fn group_by_prefix(records: &[RouteRecord]) -> BTreeMap<&str, Vec<&RouteRecord>> {
    let mut groups: BTreeMap<&str, Vec<&RouteRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.prefix.as_str()).or_default().push(record);
    }
    groups
}

/// Per-prefix path comparison, independent of the identity keys.
///
/// Every left path without an exact right match is reported once, paired with
/// the next right path that has no exact left match, if any remains.
fn changed_paths(left: &[RouteRecord], right: &[RouteRecord]) -> Vec<ChangeRecord> {
    let right_groups = group_by_prefix(right);
    let mut changed = Vec::new();

    for (prefix, before) in group_by_prefix(left) {
        let Some(after) = right_groups.get(prefix) else {
            continue;
        };
        let before_set: BTreeSet<PathTriple<'_>> = before.iter().map(|r| triple(r)).collect();
        let after_set: BTreeSet<PathTriple<'_>> = after.iter().map(|r| triple(r)).collect();
        if before_set == after_set {
            continue;
        }

        let mut unmatched_after = after
            .iter()
            .filter(|r| !before_set.contains(&triple(r)))
            .copied();
        for record in before.iter().filter(|r| !after_set.contains(&triple(r))) {
            let counterpart = unmatched_after.next();
            if counterpart.is_none() {
                debug!(prefix, "path removed from a surviving prefix");
            }
            changed.push(ChangeRecord::between(record, counterpart));
        }
    }
    changed
}
