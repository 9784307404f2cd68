//! Storage port for session snapshots.
//!
//! The store only needs three operations on an opaque byte record addressed
//! by key. [`Database`](crate::db::Database) persists records in SQLite;
//! [`MemoryStorage`] keeps them in process for tests and throwaway sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

/// A key-value backend for snapshot records.
pub trait SnapshotStorage {
    /// Read the record stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `data` under `key`, replacing any previous record.
    fn set(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Remove the record under `key`. Removing a missing record is not an error.
    fn clear(&self, key: &str) -> Result<()>;
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        (**self).set(key, data)
    }

    fn clear(&self, key: &str) -> Result<()> {
        (**self).clear(key)
    }
}

/// In-process storage. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))
    }
}

impl SnapshotStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records()?.get(key).cloned())
    }

    fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        self.records()?.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.records()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let storage = MemoryStorage::new();
        assert!(storage.get("retro").unwrap().is_none());

        storage.set("retro", b"one").unwrap();
        storage.set("retro", b"two").unwrap();
        assert_eq!(storage.get("retro").unwrap(), Some(b"two".to_vec()));

        storage.clear("retro").unwrap();
        assert!(storage.get("retro").unwrap().is_none());

        // Clearing again is fine
        storage.clear("retro").unwrap();
    }

    #[test]
    fn test_clones_share_records() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.set("retro", b"shared").unwrap();
        assert_eq!(other.get("retro").unwrap(), Some(b"shared".to_vec()));
    }

    #[test]
    fn test_keys_are_independent() {
        let storage = MemoryStorage::new();
        storage.set("a", b"1").unwrap();
        storage.set("b", b"2").unwrap();
        storage.clear("a").unwrap();

        assert!(storage.get("a").unwrap().is_none());
        assert_eq!(storage.get("b").unwrap(), Some(b"2".to_vec()));
    }
}
