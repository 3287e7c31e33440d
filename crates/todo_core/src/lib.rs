//! Core domain logic for the todo app.
//! This crate is the single source of truth for todo invariants and for the
//! store ↔ local persistence synchronization path.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;
pub mod sync;

pub use config::CoreConfig;
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::form::TodoForm;
pub use model::todo::{Importance, Todo, TodoId, TodoValidationError};
pub use service::todo_service::{
    ConfirmPrompt, CreatePhase, CreateReport, DeleteDecision, DeleteOutcome, TodoError,
    TodoResult, TodoService,
};
pub use storage::{MemoryStorage, PersistenceAdapter, SqliteStorage, StorageError};
pub use store::{
    Snapshot, StoreChange, StoreError, StoreEvent, StoreId, SubscriptionId, TodoStore,
};
pub use sync::{HydrateOutcome, SyncController, SyncError, WriteStatus, TODO_STORAGE_KEY};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
