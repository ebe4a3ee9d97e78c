use std::collections::BTreeMap;
use std::sync::RwLock;

use routesnap_ir::{RouteRecord, Timestamp};
use tracing::debug;

use crate::{SnapshotKey, SnapshotStore, StoreError, listing_order, stamped};

/// In-process store with the same semantics as [`crate::SqliteStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<BTreeMap<SnapshotKey, Vec<RouteRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save_snapshot(&self, key: &SnapshotKey, records: &[RouteRecord]) -> Result<usize, StoreError> {
        let mut snapshots = self.snapshots.write().map_err(|_| StoreError::Poisoned)?;
        if snapshots.contains_key(key) {
            return Err(StoreError::SnapshotExists(key.clone()));
        }
        let rows: Vec<RouteRecord> = records.iter().map(|record| stamped(record, key)).collect();
        let count = rows.len();
        snapshots.insert(key.clone(), rows);
        debug!(snapshot = %key, records = count, "snapshot kept in memory");
        Ok(count)
    }

    fn load_snapshot(&self, key: &SnapshotKey) -> Result<Option<Vec<RouteRecord>>, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(snapshots.get(key).cloned())
    }

    fn snapshot_exists(&self, key: &SnapshotKey) -> Result<bool, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(snapshots.contains_key(key))
    }

    fn list_snapshots(&self, hostname: Option<&str>) -> Result<Vec<SnapshotKey>, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        let mut keys: Vec<SnapshotKey> = snapshots
            .keys()
            .filter(|key| hostname.is_none_or(|host| key.hostname == host))
            .cloned()
            .collect();
        keys.sort_by(listing_order);
        Ok(keys)
    }

    fn remove_snapshot(&self, hostname: &str, timestamp: &Timestamp) -> Result<usize, StoreError> {
        let mut snapshots = self.snapshots.write().map_err(|_| StoreError::Poisoned)?;
        let mut removed = 0;
        snapshots.retain(|key, records| {
            let doomed = key.hostname == hostname && &key.timestamp == timestamp;
            if doomed {
                removed += records.len();
            }
            !doomed
        });
        Ok(removed)
    }
}
