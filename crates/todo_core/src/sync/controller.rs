//! Sync controller between `TodoStore` and a `PersistenceAdapter`.
//!
//! # Responsibility
//! - Decode the persisted snapshot into the store (`hydrate`, `refresh`).
//! - Encode and write whole-collection snapshots (`on_store_changed`).
//!
//! # Invariants
//! - Hydration runs at most once per controller and only on an empty store.
//! - Writes are single-flight: one write at a time, ordered by store version.
//! - A controller writes for one store only; the first snapshot binds it.
//! - Write failures never roll back the in-memory mutation.

use crate::model::todo::Todo;
use crate::storage::{PersistenceAdapter, StorageError};
use crate::store::{Snapshot, StoreId, TodoStore};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Storage key holding the serialized todo collection.
pub const TODO_STORAGE_KEY: &str = "todo";

pub type SyncResult<T> = Result<T, SyncError>;

/// Persistence failures seen by the sync controller.
#[derive(Debug)]
pub enum SyncError {
    /// Adapter could not read the snapshot blob.
    Read(StorageError),
    /// Stored blob is not a well-formed todo sequence.
    Decode(serde_json::Error),
    /// Collection could not be serialized.
    Encode(serde_json::Error),
    /// Adapter could not write the snapshot blob.
    Write(StorageError),
    /// A previous writer panicked while holding the write lock.
    WriteLockPoisoned,
    /// Snapshot came from a store other than the one this controller writes for.
    ForeignStore { bound: StoreId, found: StoreId },
}

impl SyncError {
    /// Returns whether this error happened on the read path.
    pub fn is_read_error(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Decode(_))
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Read(_) => "snapshot_read_failed",
            Self::Decode(_) => "snapshot_decode_failed",
            Self::Encode(_) => "snapshot_encode_failed",
            Self::Write(_) => "snapshot_write_failed",
            Self::WriteLockPoisoned => "write_lock_poisoned",
            Self::ForeignStore { .. } => "foreign_store",
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read todo snapshot: {err}"),
            Self::Decode(err) => write!(f, "stored todo snapshot is malformed: {err}"),
            Self::Encode(err) => write!(f, "failed to encode todo snapshot: {err}"),
            Self::Write(err) => write!(f, "failed to write todo snapshot: {err}"),
            Self::WriteLockPoisoned => write!(f, "snapshot write lock poisoned"),
            Self::ForeignStore { bound, found } => write!(
                f,
                "snapshot from {found} rejected; controller writes for {bound}"
            ),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) | Self::Write(err) => Some(err),
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::WriteLockPoisoned | Self::ForeignStore { .. } => None,
        }
    }
}

/// Result of a startup hydration attempt.
#[derive(Debug)]
pub enum HydrateOutcome {
    /// Persisted snapshot installed into the store.
    Loaded { count: usize },
    /// Nothing persisted yet; store reset to empty.
    Empty,
    /// Read or decode failed; store reset to empty and the error logged.
    Recovered { error: SyncError },
    /// Hydration already ran this session, or the store was not empty.
    Skipped,
}

/// Result of a successful `on_store_changed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Snapshot written; the blob now equals this version.
    Written { version: u64 },
    /// A newer snapshot was already attempted; this one was dropped.
    Superseded { version: u64, newest: u64 },
}

#[derive(Debug, Default)]
struct WriteState {
    store: Option<StoreId>,
    newest_attempted: Option<u64>,
    last_written: Option<u64>,
}

/// Keeps the persisted snapshot consistent with a `TodoStore`.
pub struct SyncController<A: PersistenceAdapter> {
    adapter: A,
    key: String,
    hydrated: AtomicBool,
    writes: Mutex<WriteState>,
}

impl<A: PersistenceAdapter> SyncController<A> {
    /// Creates a controller writing under `TODO_STORAGE_KEY`.
    pub fn new(adapter: A) -> Self {
        Self::with_key(adapter, TODO_STORAGE_KEY)
    }

    /// Creates a controller writing under a custom key.
    pub fn with_key(adapter: A, key: impl Into<String>) -> Self {
        Self {
            adapter,
            key: key.into(),
            hydrated: AtomicBool::new(false),
            writes: Mutex::new(WriteState::default()),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Returns whether hydration already ran for this controller.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated.load(Ordering::Acquire)
    }

    /// Loads the persisted snapshot into `store` once per session.
    ///
    /// Never fails: read/decode errors reset the store to empty and are
    /// returned inside `HydrateOutcome::Recovered`.
    pub fn hydrate(&self, store: &mut TodoStore) -> HydrateOutcome {
        if self
            .hydrated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return HydrateOutcome::Skipped;
        }
        if !store.is_empty() {
            info!(
                "event=hydrate module=sync status=skipped reason=store_not_empty size={}",
                store.len()
            );
            return HydrateOutcome::Skipped;
        }

        let started_at = Instant::now();
        match self.read_snapshot() {
            Ok(Some(todos)) => {
                let count = todos.len();
                store.replace_all(todos);
                info!(
                    "event=hydrate module=sync status=ok count={} duration_ms={}",
                    count,
                    started_at.elapsed().as_millis()
                );
                HydrateOutcome::Loaded { count }
            }
            Ok(None) => {
                store.replace_all(Vec::new());
                info!(
                    "event=hydrate module=sync status=ok count=0 reason=absent duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                HydrateOutcome::Empty
            }
            Err(error) => {
                store.replace_all(Vec::new());
                warn!(
                    "event=hydrate module=sync status=recovered error_code={} error={}",
                    error.code(),
                    error
                );
                HydrateOutcome::Recovered { error }
            }
        }
    }

    /// Re-reads the persisted snapshot on user request.
    ///
    /// On failure the in-memory collection is kept as is.
    pub fn refresh(&self, store: &mut TodoStore) -> SyncResult<usize> {
        match self.read_snapshot() {
            Ok(todos) => {
                let todos = todos.unwrap_or_default();
                let count = todos.len();
                store.replace_all(todos);
                info!("event=refresh module=sync status=ok count={count}");
                Ok(count)
            }
            Err(err) => {
                warn!(
                    "event=refresh module=sync status=error error_code={} error={}",
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Persists `snapshot` as the whole stored collection.
    ///
    /// Snapshots older than one already attempted are dropped as
    /// `WriteStatus::Superseded`. A snapshot whose write failed may be
    /// retried with the same version.
    ///
    /// # Errors
    /// - `SyncError::ForeignStore` when `snapshot` belongs to a store other
    ///   than the one whose snapshot this controller first received.
    pub fn on_store_changed(&self, snapshot: &Snapshot) -> SyncResult<WriteStatus> {
        let mut state = self
            .writes
            .lock()
            .map_err(|_| SyncError::WriteLockPoisoned)?;

        let bound = *state.store.get_or_insert(snapshot.store);
        if bound != snapshot.store {
            let err = SyncError::ForeignStore {
                bound,
                found: snapshot.store,
            };
            error!(
                "event=snapshot_write module=sync status=error version={} error_code={} error={}",
                snapshot.version,
                err.code(),
                err
            );
            return Err(err);
        }

        if let Some(newest) = state.newest_attempted {
            let stale = snapshot.version < newest;
            let already_written = state.last_written == Some(snapshot.version);
            if stale || already_written {
                info!(
                    "event=snapshot_write module=sync status=superseded version={} newest={}",
                    snapshot.version, newest
                );
                return Ok(WriteStatus::Superseded {
                    version: snapshot.version,
                    newest,
                });
            }
        }
        state.newest_attempted = Some(snapshot.version);

        let started_at = Instant::now();
        let result = serde_json::to_string(&snapshot.todos)
            .map_err(SyncError::Encode)
            .and_then(|blob| {
                self.adapter
                    .set(&self.key, &blob)
                    .map_err(SyncError::Write)
            });

        match result {
            Ok(()) => {
                state.last_written = Some(snapshot.version);
                info!(
                    "event=snapshot_write module=sync status=ok version={} count={} duration_ms={}",
                    snapshot.version,
                    snapshot.todos.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(WriteStatus::Written {
                    version: snapshot.version,
                })
            }
            Err(err) => {
                error!(
                    "event=snapshot_write module=sync status=error version={} error_code={} error={}",
                    snapshot.version,
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Returns the store version most recently written to storage.
    pub fn last_written_version(&self) -> Option<u64> {
        self.writes
            .lock()
            .ok()
            .and_then(|state| state.last_written)
    }

    fn read_snapshot(&self) -> SyncResult<Option<Vec<Todo>>> {
        let Some(blob) = self.adapter.get(&self.key).map_err(SyncError::Read)? else {
            return Ok(None);
        };
        let todos = serde_json::from_str::<Vec<Todo>>(&blob).map_err(SyncError::Decode)?;
        Ok(Some(todos))
    }
}
