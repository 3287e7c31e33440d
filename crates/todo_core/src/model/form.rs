//! Transient creation form state.
//!
//! # Responsibility
//! - Hold the fields a user edits before submitting a new todo.
//! - Provide the submit gate and post-success reset.
//!
//! # Invariants
//! - The form is only reset after a record was actually added.

use crate::model::todo::Importance;
use chrono::{DateTime, Utc};

/// Field values of the "new todo" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoForm {
    pub todo_name: String,
    pub deadline: Option<DateTime<Utc>>,
    pub importance: Option<Importance>,
    pub description: String,
}

impl TodoForm {
    /// Creates an empty form whose deadline defaults to `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            todo_name: String::new(),
            deadline: Some(now),
            importance: None,
            description: String::new(),
        }
    }

    /// Returns whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.todo_name.trim().is_empty()
    }

    /// Restores default field values.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }
}

impl Default for TodoForm {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
