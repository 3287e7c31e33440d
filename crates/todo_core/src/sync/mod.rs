//! Store ↔ persistence synchronization.
//!
//! # Responsibility
//! - Hydrate the in-memory store from the persisted snapshot at startup.
//! - Persist the full collection after every store mutation.
//!
//! # Invariants
//! - The sync controller is the only writer of the snapshot blob.
//! - Read failures never propagate out of hydration.
//! - A stale snapshot never overwrites a newer one.

pub mod controller;

pub use controller::{
    HydrateOutcome, SyncController, SyncError, SyncResult, WriteStatus, TODO_STORAGE_KEY,
};
