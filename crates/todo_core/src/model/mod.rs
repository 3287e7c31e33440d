//! Domain model for todo records and the creation form draft.
//!
//! # Responsibility
//! - Define the canonical todo record shared by store, sync and UI layers.
//! - Keep the persisted wire shape (`camelCase` JSON) in one place.
//!
//! # Invariants
//! - Every record is identified by an opaque, immutable `TodoId`.
//! - `todoName` is validated at creation time, never silently repaired.

pub mod form;
pub mod todo;
