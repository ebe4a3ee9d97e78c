//! Snapshot persistence for parsed route tables.
//!
//! A snapshot is every record of one `(hostname, service, timestamp)` key,
//! written once and never edited. Stores are passed explicitly to callers:
//! - [`SqliteStore`] persists to a SQLite file (or memory)
//! - [`MemoryStore`] keeps snapshots in a lock-guarded map
//!
//! # Example
//!
//! ```rust
//! use routesnap_ir::{RouteRecord, Timestamp};
//! use routesnap_store::{MemoryStore, SnapshotKey, SnapshotStore};
//!
//! let store = MemoryStore::new();
//! let key = SnapshotKey::new("pe1", "Base", Timestamp::parse("2024-05-09_08:30").expect("ts"));
//! let record = RouteRecord::new("10.0.0.0/24").expect("prefix");
//! store.save_snapshot(&key, &[record]).expect("saved");
//! assert!(store.snapshot_exists(&key).expect("lookup"));
//! ```

mod memory;
mod sqlite;

use std::fmt;

use routesnap_ir::{RouteRecord, Timestamp};
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Identity of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub hostname: String,
    pub service: String,
    pub timestamp: Timestamp,
}

impl SnapshotKey {
    pub fn new(hostname: impl Into<String>, service: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            hostname: hostname.into(),
            service: service.into(),
            timestamp,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.hostname, self.service, self.timestamp)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("snapshot {0} already exists")]
    SnapshotExists(SnapshotKey),

    #[error("invalid value '{value}' in column {column}")]
    InvalidColumn { column: &'static str, value: String },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Snapshot persistence shared by ingestion and the diff engine.
///
/// Writes are atomic per key: readers see all records of a snapshot or none.
pub trait SnapshotStore: Send + Sync {
    /// Persist `records` under `key`. Returns the number of records written.
    ///
    /// An empty slice records an existing-but-empty table.
    fn save_snapshot(&self, key: &SnapshotKey, records: &[RouteRecord]) -> Result<usize, StoreError>;

    /// Records of `key` in insertion order, stamped with the key; `None` when absent.
    fn load_snapshot(&self, key: &SnapshotKey) -> Result<Option<Vec<RouteRecord>>, StoreError>;

    fn snapshot_exists(&self, key: &SnapshotKey) -> Result<bool, StoreError>;

    /// Stored keys, newest timestamp first, then hostname and service.
    fn list_snapshots(&self, hostname: Option<&str>) -> Result<Vec<SnapshotKey>, StoreError>;

    /// Delete every service snapshot of `hostname` at `timestamp`.
    /// Returns the number of records removed.
    fn remove_snapshot(&self, hostname: &str, timestamp: &Timestamp) -> Result<usize, StoreError>;
}

/// Newest first, then hostname, then service.
pub(crate) fn listing_order(a: &SnapshotKey, b: &SnapshotKey) -> std::cmp::Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| a.hostname.cmp(&b.hostname))
        .then_with(|| a.service.cmp(&b.service))
}

/// Copy of `record` carrying the snapshot identity of `key`.
pub(crate) fn stamped(record: &RouteRecord, key: &SnapshotKey) -> RouteRecord {
    let mut record = record.clone();
    record.stamp(&key.hostname, &key.service, &key.timestamp);
    record
}
