//! In-process adapter used by tests and ephemeral sessions.

use super::{PersistenceAdapter, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Blob storage kept in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-seeded with one blob.
    pub fn with_blob(key: &str, value: impl Into<String>) -> Self {
        let storage = Self::default();
        if let Ok(mut blobs) = storage.blobs.lock() {
            blobs.insert(key.to_string(), value.into());
        }
        storage
    }

    /// Returns the raw stored blob, bypassing the adapter contract.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs
            .lock()
            .ok()
            .and_then(|blobs| blobs.get(key).cloned())
    }
}

impl PersistenceAdapter for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::LockPoisoned("memory_storage"))?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::LockPoisoned("memory_storage"))?;
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStorage;
    use crate::storage::PersistenceAdapter;

    #[test]
    fn get_missing_key_returns_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("todo").unwrap(), None);
    }

    #[test]
    fn set_replaces_previous_blob() {
        let storage = MemoryStorage::with_blob("todo", "[1]");
        storage.set("todo", "[]").unwrap();
        assert_eq!(storage.raw("todo").as_deref(), Some("[]"));
    }
}
