//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve the database path and logging settings from defaults and env.
//!
//! # Invariants
//! - Blank environment values are treated as unset.

use crate::logging::{LogLevel, LoggingError};
use std::path::PathBuf;

/// Overrides the database file path.
pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
/// Overrides the log level (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";
/// Enables file logging under this absolute directory.
pub const ENV_LOG_DIR: &str = "TODO_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "todo_core.sqlite3";

/// Settings needed to boot the todo core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// `None` keeps file logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: LogLevel::build_default(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Builds a config from defaults overridden by process environment.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from defaults overridden by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = LogLevel::parse(&level)?;
        }
        config.log_dir = value(ENV_LOG_DIR).map(PathBuf::from);
        Ok(config)
    }
}
