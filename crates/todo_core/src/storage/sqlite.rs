//! SQLite-backed blob adapter.
//!
//! # Responsibility
//! - Persist named blobs in the `kv_store` table.
//! - Create that table on first open and refuse files from newer builds.
//!
//! # Invariants
//! - `PRAGMA user_version` is `KV_SCHEMA_VERSION` once a connection is wrapped.
//! - One statement per call; `set` is a single upsert.

use super::{PersistenceAdapter, StorageError, StorageResult};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Schema revision written to `PRAGMA user_version`.
pub const KV_SCHEMA_VERSION: u32 = 1;

const CREATE_KV_STORE: &str = "
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);";

/// Durable adapter over a SQLite `kv_store` table.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens the database file at `path`, creating it and the table if needed.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::connect("file", || Connection::open(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::connect("memory", Connection::open_in_memory)
    }

    /// Wraps an existing connection after bringing its schema up to date.
    ///
    /// # Errors
    /// - `StorageError::UnsupportedSchema` when the file was written by a
    ///   newer build.
    pub fn from_connection(mut conn: Connection) -> StorageResult<Self> {
        ensure_schema(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connect(
        mode: &'static str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StorageResult<Self> {
        let started_at = Instant::now();
        let result = connect()
            .map_err(StorageError::from)
            .and_then(|conn| {
                conn.busy_timeout(Duration::from_secs(5))?;
                Self::from_connection(conn)
            });

        match &result {
            Ok(_) => info!(
                "event=kv_open module=storage status=ok mode={} schema_version={} duration_ms={}",
                mode,
                KV_SCHEMA_VERSION,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=kv_open module=storage status=error mode={} duration_ms={} error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::LockPoisoned("sqlite_storage"))
    }
}

fn ensure_schema(conn: &mut Connection) -> StorageResult<()> {
    let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    if found > KV_SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema {
            found,
            supported: KV_SCHEMA_VERSION,
        });
    }
    if found == KV_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_KV_STORE)?;
    tx.execute_batch(&format!("PRAGMA user_version = {KV_SCHEMA_VERSION};"))?;
    tx.commit()?;
    info!(
        "event=kv_schema module=storage status=created from_version={} to_version={}",
        found, KV_SCHEMA_VERSION
    );
    Ok(())
}

impl PersistenceAdapter for SqliteStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        debug!(
            "event=kv_get module=storage status=ok key={} found={}",
            key,
            value.is_some()
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        debug!(
            "event=kv_set module=storage status=ok key={} bytes={}",
            key,
            value.len()
        );
        Ok(())
    }
}
