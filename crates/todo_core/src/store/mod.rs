//! In-memory authoritative todo collection.
//!
//! # Responsibility
//! - Own the ordered collection and its three mutations.
//! - Notify subscribers after every effective mutation.
//!
//! # Invariants
//! - Ids are unique across the collection for records added via `add`.
//! - Store operations never perform I/O.

pub mod todo_store;

pub use todo_store::{
    Snapshot, StoreChange, StoreError, StoreEvent, StoreListener, StoreId, StoreResult,
    SubscriptionId, TodoStore,
};
