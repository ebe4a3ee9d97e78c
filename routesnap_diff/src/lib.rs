//! Snapshot comparison and reporting for `routesnap_ir::RouteRecord` lists.
//!
//! Records are matched across two snapshots by an identity key built from a
//! configurable field set. Records whose key appears on one side only are
//! Added or Deleted; prefixes present on both sides whose path attributes
//! differ produce Changed entries.
//!
//! Primary entrypoints:
//! - [`compare`]
//! - [`compare_records`]
//! - [`format_text_report`]
//! - [`format_csv_report`]
//!
//! # Example
//!
//! ```rust
//! use routesnap_diff::{compare_records, CompareOptions};
//! use routesnap_ir::{NextHop, RouteRecord};
//!
//! let hop = |text: &str| NextHop::parse(text).unwrap();
//! let before = vec![RouteRecord::new("10.0.0.0/24").unwrap().with_next_hop(hop("10.10.10.1"))];
//! let after = vec![RouteRecord::new("10.0.0.0/24").unwrap().with_next_hop(hop("10.10.20.1"))];
//! let result = compare_records(&before, &after, &CompareOptions::default());
//! assert_eq!(result.changed.len(), 1);
//! assert!(result.added.is_empty() && result.deleted.is_empty());
//! ```

mod engine;
mod model;
mod report;

pub use engine::{compare_records, identity_key};
pub use model::{ChangeRecord, CompareOptions, ComparisonResult, ComparisonStats, IdentityField};
pub use report::{CSV_HEADER, format_csv_report, format_csv_rows, format_text_report};

use routesnap_ir::Timestamp;
use routesnap_store::{SnapshotKey, SnapshotStore, StoreError};
use tracing::{debug, info};

/// Compare the `hostname`/`service` snapshot at `ts1` against the one at `ts2`.
///
/// A snapshot missing on either side yields an empty result. Use
/// [`SnapshotStore::snapshot_exists`] beforehand to tell "no data" apart from
/// "no differences".
pub fn compare(
    store: &dyn SnapshotStore,
    hostname: &str,
    service: &str,
    ts1: &Timestamp,
    ts2: &Timestamp,
    options: &CompareOptions,
) -> Result<ComparisonResult, StoreError> {
    let left_key = SnapshotKey::new(hostname, service, ts1.clone());
    let right_key = SnapshotKey::new(hostname, service, ts2.clone());

    let Some(left) = store.load_snapshot(&left_key)? else {
        debug!(snapshot = %left_key, "no snapshot stored");
        return Ok(ComparisonResult::default());
    };
    let Some(right) = store.load_snapshot(&right_key)? else {
        debug!(snapshot = %right_key, "no snapshot stored");
        return Ok(ComparisonResult::default());
    };

    let result = compare_records(&left, &right, options);
    let stats = result.stats();
    info!(
        hostname,
        service,
        from = %ts1,
        to = %ts2,
        added = stats.added,
        deleted = stats.deleted,
        changed = stats.changed,
        "comparison complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests;
