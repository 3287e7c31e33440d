//! Persistence adapters for named blobs in durable local storage.
//!
//! # Responsibility
//! - Define the get/set contract the sync controller writes through.
//! - Isolate SQLite details from sync and service orchestration.
//!
//! # Invariants
//! - `set` replaces the stored blob wholesale; there is no partial update.
//! - `get` on a key that was never written returns `Ok(None)`.

pub mod memory;
pub mod sqlite;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a persistence adapter.
#[derive(Debug)]
pub enum StorageError {
    /// SQLite statement or connection failure.
    Sqlite(rusqlite::Error),
    /// Database file carries a schema newer than this build understands.
    UnsupportedSchema { found: u32, supported: u32 },
    /// A previous holder of the adapter lock panicked.
    LockPoisoned(&'static str),
    /// Backend is not reachable (platform keystore locked, disk full, ...).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchema { found, supported } => write!(
                f,
                "storage schema version {found} is newer than supported {supported}"
            ),
            Self::LockPoisoned(name) => write!(f, "storage lock poisoned: {name}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchema { .. } | Self::LockPoisoned(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Durable get/set of a named blob.
///
/// Implementations must be shareable across threads; callers never hold
/// the adapter across a store mutation.
pub trait PersistenceAdapter: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

impl<A: PersistenceAdapter + ?Sized> PersistenceAdapter for std::sync::Arc<A> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }
}
