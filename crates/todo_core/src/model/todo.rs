//! Todo domain model.
//!
//! # Responsibility
//! - Define the todo record and its importance levels.
//! - Provide creation-time validation for user-supplied fields.
//!
//! # Invariants
//! - `id` and `created_at` never change after construction.
//! - `todo_name` is non-empty after trimming when built through `Todo::new`.
//! - Wire field names match the persisted snapshot format exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum accepted length of `todo_name`, in characters.
pub const MAX_TODO_NAME_CHARS: usize = 100;
/// Maximum accepted length of `description`, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Opaque stable identifier of a todo record.
///
/// Kept as a plain string so identifiers written by older builds
/// (wall-clock millis) still load unchanged.
pub type TodoId = String;

/// User-assigned priority of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    /// Returns the stable lowercase label used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a label case-insensitively; unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Importance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for user-supplied todo fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// `todo_name` is empty after trimming.
    EmptyName,
    /// `todo_name` exceeds `MAX_TODO_NAME_CHARS`.
    NameTooLong { chars: usize },
    /// `description` exceeds `MAX_DESCRIPTION_CHARS`.
    DescriptionTooLong { chars: usize },
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "todo name cannot be empty"),
            Self::NameTooLong { chars } => write!(
                f,
                "todo name has {chars} characters; at most {MAX_TODO_NAME_CHARS} allowed"
            ),
            Self::DescriptionTooLong { chars } => write!(
                f,
                "description has {chars} characters; at most {MAX_DESCRIPTION_CHARS} allowed"
            ),
        }
    }
}

impl Error for TodoValidationError {}

/// One task entity, exactly as persisted in the snapshot blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub todo_name: String,
    pub deadline: Option<DateTime<Utc>>,
    pub importance: Option<Importance>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a validated todo with a generated UUID v4 identifier.
    ///
    /// The name is trimmed before it is stored.
    ///
    /// # Errors
    /// - Returns `TodoValidationError` when any field violates creation rules.
    pub fn new(
        todo_name: &str,
        deadline: Option<DateTime<Utc>>,
        importance: Option<Importance>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TodoValidationError> {
        let todo = Self {
            id: Uuid::new_v4().to_string(),
            todo_name: todo_name.trim().to_string(),
            deadline,
            importance,
            description: description.into(),
            created_at,
        };
        todo.validate()?;
        Ok(todo)
    }

    /// Checks creation rules for user-supplied fields.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.todo_name.trim().is_empty() {
            return Err(TodoValidationError::EmptyName);
        }
        let name_chars = self.todo_name.chars().count();
        if name_chars > MAX_TODO_NAME_CHARS {
            return Err(TodoValidationError::NameTooLong { chars: name_chars });
        }
        let description_chars = self.description.chars().count();
        if description_chars > MAX_DESCRIPTION_CHARS {
            return Err(TodoValidationError::DescriptionTooLong {
                chars: description_chars,
            });
        }
        Ok(())
    }
}
