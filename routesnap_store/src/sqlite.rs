use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use routesnap_ir::{BgpAttributes, NextHop, RouteRecord, Timestamp};
use tracing::{debug, info};

use crate::{SnapshotKey, SnapshotStore, StoreError, stamped};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS snapshots (
    hostname TEXT NOT NULL,
    service TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    PRIMARY KEY (hostname, service, timestamp)
);

CREATE TABLE IF NOT EXISTS routes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hostname TEXT NOT NULL,
    service TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    route TEXT NOT NULL,
    flags TEXT,
    route_type TEXT,
    route_protocol TEXT,
    age TEXT,
    preference INTEGER,
    next_hop TEXT,
    interface_next_hop TEXT,
    interface TEXT,
    metric INTEGER,
    as_path TEXT,
    path_id INTEGER,
    label INTEGER,
    igp_cost INTEGER,
    FOREIGN KEY (hostname, service, timestamp)
        REFERENCES snapshots (hostname, service, timestamp) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_routes_snapshot ON routes (hostname, service, timestamp);
"#;

const ROUTE_COLUMNS: &str = "route, flags, route_type, route_protocol, age, preference, next_hop, \
     interface_next_hop, interface, metric, as_path, path_id, label, igp_cost";

/// SQLite-backed [`SnapshotStore`].
///
/// One connection guarded by a mutex; every snapshot write is one transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "snapshot database opened");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Flush and close the underlying connection.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self.conn.into_inner().map_err(|_| StoreError::Poisoned)?;
        conn.close().map_err(|(_, err)| StoreError::Sqlite(err))
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        configure(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn configure(conn: &Connection) -> Result<(), StoreError> {
    // In-memory databases answer "memory" instead of "wal".
    let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    conn.execute("PRAGMA synchronous=NORMAL", [])?;
    conn.execute("PRAGMA foreign_keys=ON", [])?;
    Ok(())
}

impl SnapshotStore for SqliteStore {
    fn save_snapshot(&self, key: &SnapshotKey, records: &[RouteRecord]) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT INTO snapshots (hostname, service, timestamp) VALUES (?1, ?2, ?3)",
            params![key.hostname, key.service, key.timestamp.as_str()],
        );
        match inserted {
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::SnapshotExists(key.clone()));
            }
            other => {
                other?;
            }
        }

        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO routes (hostname, service, timestamp, {ROUTE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
            ))?;
            for record in records {
                let bgp = record.bgp.as_ref();
                stmt.execute(params![
                    key.hostname,
                    key.service,
                    key.timestamp.as_str(),
                    record.prefix,
                    record.flags,
                    record.route_type.map(|t| t.as_str()),
                    record.route_protocol.map(|p| p.as_str()),
                    record.age,
                    record.preference,
                    record.next_hop.as_ref().map(ToString::to_string),
                    record.interface_next_hop,
                    record.interface,
                    record.metric,
                    bgp.map(BgpAttributes::as_path_text),
                    bgp.and_then(|b| b.path_id),
                    bgp.and_then(|b| b.label),
                    bgp.and_then(|b| b.igp_cost),
                ])?;
            }
        }

        tx.commit()?;
        info!(snapshot = %key, records = records.len(), "snapshot stored");
        Ok(records.len())
    }

    fn load_snapshot(&self, key: &SnapshotKey) -> Result<Option<Vec<RouteRecord>>, StoreError> {
        let conn = self.lock()?;
        if !exists(&conn, key)? {
            debug!(snapshot = %key, "snapshot not found");
            return Ok(None);
        }

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {ROUTE_COLUMNS} FROM routes
             WHERE hostname = ?1 AND service = ?2 AND timestamp = ?3
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(
            params![key.hostname, key.service, key.timestamp.as_str()],
            RawRoute::from_row,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(stamped(&row?.into_record()?, key));
        }
        Ok(Some(records))
    }

    fn snapshot_exists(&self, key: &SnapshotKey) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        exists(&conn, key)
    }

    fn list_snapshots(&self, hostname: Option<&str>) -> Result<Vec<SnapshotKey>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT hostname, service, timestamp FROM snapshots
             WHERE ?1 IS NULL OR hostname = ?1
             ORDER BY timestamp DESC, hostname, service",
        )?;
        let rows = stmt.query_map(params![hostname], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut keys = Vec::new();
        for row in rows {
            let (hostname, service, timestamp) = row?;
            keys.push(SnapshotKey::new(hostname, service, parse_timestamp(timestamp)?));
        }
        Ok(keys)
    }

    fn remove_snapshot(&self, hostname: &str, timestamp: &Timestamp) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM routes WHERE hostname = ?1 AND timestamp = ?2",
            params![hostname, timestamp.as_str()],
        )?;
        let snapshots = tx.execute(
            "DELETE FROM snapshots WHERE hostname = ?1 AND timestamp = ?2",
            params![hostname, timestamp.as_str()],
        )?;
        tx.commit()?;
        info!(hostname, timestamp = %timestamp, snapshots, records = removed, "snapshot removed");
        Ok(removed)
    }
}

fn exists(conn: &Connection, key: &SnapshotKey) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM snapshots WHERE hostname = ?1 AND service = ?2 AND timestamp = ?3",
            params![key.hostname, key.service, key.timestamp.as_str()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_timestamp(text: String) -> Result<Timestamp, StoreError> {
    Timestamp::try_from(text).map_err(|err| StoreError::InvalidColumn {
        column: "timestamp",
        value: err.0,
    })
}

/// Column values as stored, before typed decoding.
struct RawRoute {
    route: String,
    flags: Option<String>,
    route_type: Option<String>,
    route_protocol: Option<String>,
    age: Option<String>,
    preference: Option<u32>,
    next_hop: Option<String>,
    interface_next_hop: Option<String>,
    interface: Option<String>,
    metric: Option<u32>,
    as_path: Option<String>,
    path_id: Option<u32>,
    label: Option<u32>,
    igp_cost: Option<u32>,
}

impl RawRoute {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            route: row.get(0)?,
            flags: row.get(1)?,
            route_type: row.get(2)?,
            route_protocol: row.get(3)?,
            age: row.get(4)?,
            preference: row.get(5)?,
            next_hop: row.get(6)?,
            interface_next_hop: row.get(7)?,
            interface: row.get(8)?,
            metric: row.get(9)?,
            as_path: row.get(10)?,
            path_id: row.get(11)?,
            label: row.get(12)?,
            igp_cost: row.get(13)?,
        })
    }

    fn into_record(self) -> Result<RouteRecord, StoreError> {
        let mut record = RouteRecord::new(self.route.as_str()).map_err(|_| StoreError::InvalidColumn {
            column: "route",
            value: self.route.clone(),
        })?;
        record.flags = self.flags;
        record.route_type = self
            .route_type
            .map(|text| {
                text.parse().map_err(|_| StoreError::InvalidColumn {
                    column: "route_type",
                    value: text,
                })
            })
            .transpose()?;
        record.route_protocol = self
            .route_protocol
            .map(|text| {
                text.parse().map_err(|_| StoreError::InvalidColumn {
                    column: "route_protocol",
                    value: text,
                })
            })
            .transpose()?;
        record.age = self.age;
        record.preference = self.preference;
        record.next_hop = self.next_hop.as_deref().and_then(NextHop::parse);
        record.interface_next_hop = self.interface_next_hop;
        record.interface = self.interface;
        record.metric = self.metric;
        record.bgp = self
            .as_path
            .map(|text| {
                let as_path = BgpAttributes::parse_as_path(&text).ok_or(StoreError::InvalidColumn {
                    column: "as_path",
                    value: text.clone(),
                })?;
                Ok::<_, StoreError>(BgpAttributes {
                    as_path,
                    path_id: self.path_id,
                    label: self.label,
                    igp_cost: self.igp_cost,
                })
            })
            .transpose()?;
        Ok(record)
    }
}
