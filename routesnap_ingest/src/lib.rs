//! Turns raw device captures into stored route snapshots.
//!
//! A capture is the text of one device session. It is parsed with the grammar
//! picked by a [`Vendor`] selector, split into one [`Snapshot`] per service
//! table, stamped with the device hostname and the collection timestamp, and
//! written to a [`SnapshotStore`].
//!
//! # Example
//!
//! ```rust
//! use routesnap_ingest::{DeviceCapture, Vendor, ingest};
//! use routesnap_ir::Timestamp;
//! use routesnap_store::{MemoryStore, SnapshotStore};
//!
//! let raw = "\
//! A:pe1# show router route-table
//! Route Table (Router: Base)
//! -------------------------------------------------------------------------------
//! 1.1.1.2/32                                    Local   Local     76d07h31m  0
//!        loop-1                                                       0
//! -------------------------------------------------------------------------------
//! ";
//! let store = MemoryStore::new();
//! let ts = Timestamp::parse("2024-05-09_08:30").unwrap();
//! let saved = ingest(&store, &DeviceCapture::new("pe1", raw, Vendor::Auto), &ts).unwrap();
//! assert_eq!(saved.len(), 1);
//! assert_eq!(store.list_snapshots(Some("pe1")).unwrap().len(), 1);
//! ```

mod vendor;

use rayon::prelude::*;
use routesnap_ir::{RouteRecord, RouteTables, Timestamp, process, process_records};
use routesnap_store::{SnapshotKey, SnapshotStore, StoreError};
use tracing::{debug, info, warn};

pub use vendor::Vendor;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unsupported vendor '{0}'")]
    UnsupportedVendor(String),

    #[error("no supported route table header found in capture")]
    UndetectedVendor,

    #[error("no route table or route record found in capture")]
    NoRouteTables,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records of one service table, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub key: SnapshotKey,
    pub records: Vec<RouteRecord>,
}

/// Raw text collected from one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapture {
    pub hostname: String,
    pub raw: String,
    pub vendor: Vendor,
}

impl DeviceCapture {
    pub fn new(hostname: impl Into<String>, raw: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            hostname: hostname.into(),
            raw: raw.into(),
            vendor,
        }
    }
}

/// A snapshot written by [`ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub key: SnapshotKey,
    pub records: usize,
}

/// Result of ingesting one device within a batch.
#[derive(Debug)]
pub struct DeviceOutcome {
    pub hostname: String,
    pub result: Result<Vec<SavedSnapshot>, IngestError>,
}

/// Parse `raw` and split it into per-service snapshots for `hostname` at `timestamp`.
///
/// A capture without any table header is read as bare records of the
/// grammar's default service. When that yields no record either, the capture
/// is rejected with [`IngestError::NoRouteTables`].
pub fn parse_capture(
    vendor: Vendor,
    raw: &str,
    hostname: &str,
    timestamp: &Timestamp,
) -> Result<Vec<Snapshot>, IngestError> {
    let vendor = vendor.detect(raw)?;
    let grammar = vendor.grammar().ok_or(IngestError::UndetectedVendor)?;

    let mut tables = process(raw, grammar);
    if tables.tables.is_empty() {
        debug!(hostname, %vendor, "no table header, reading bare records");
        tables = process_records(raw, grammar);
        if tables.record_count() == 0 {
            report_findings(hostname, &tables);
            return Err(IngestError::NoRouteTables);
        }
    }
    report_findings(hostname, &tables);

    let snapshots = tables
        .tables
        .into_iter()
        .map(|(service, mut records)| {
            for record in &mut records {
                record.stamp(hostname, &service, timestamp);
            }
            Snapshot {
                key: SnapshotKey::new(hostname, service, timestamp.clone()),
                records,
            }
        })
        .collect();
    Ok(snapshots)
}

fn report_findings(hostname: &str, tables: &RouteTables) {
    for finding in tables.findings() {
        warn!(
            hostname,
            code = %finding.code,
            line = finding.span.line,
            "{}",
            finding.message
        );
    }
}

/// Parse one capture and store every service table it contains.
///
/// Snapshots are written one service at a time; a failure leaves earlier
/// services of the same capture in place.
pub fn ingest(
    store: &dyn SnapshotStore,
    capture: &DeviceCapture,
    timestamp: &Timestamp,
) -> Result<Vec<SavedSnapshot>, IngestError> {
    let snapshots = parse_capture(capture.vendor, &capture.raw, &capture.hostname, timestamp)?;
    let mut saved = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let records = store.save_snapshot(&snapshot.key, &snapshot.records)?;
        info!(snapshot = %snapshot.key, records, "snapshot stored");
        saved.push(SavedSnapshot {
            key: snapshot.key,
            records,
        });
    }
    Ok(saved)
}

/// Ingest many captures in parallel. One outcome per capture, in input order.
pub fn ingest_batch(
    store: &dyn SnapshotStore,
    captures: &[DeviceCapture],
    timestamp: &Timestamp,
) -> Vec<DeviceOutcome> {
    captures
        .par_iter()
        .map(|capture| {
            let result = ingest(store, capture, timestamp);
            if let Err(err) = &result {
                warn!(hostname = %capture.hostname, error = %err, "device ingestion failed");
            }
            DeviceOutcome {
                hostname: capture.hostname.clone(),
                result,
            }
        })
        .collect()
}
