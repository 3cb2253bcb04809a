//! In-memory key-value store.
//!
//! Used for native builds and tests. Data lives as long as the last clone of
//! the store and is not persisted across restarts.

use super::{KeyValueStore, StorageConfig, StorageError, StoreStats};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A simple in-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new(_config: StorageConfig) -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, String>>, StorageError> {
        self.data
            .read()
            .map_err(|e| StorageError::Other(e.to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, String>>, StorageError> {
        self.data
            .write()
            .map_err(|e| StorageError::Other(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    async fn open(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        self.write()?.insert(key.to_string(), json);
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let data = self.read()?;
        match data.get(key) {
            Some(json) => {
                let value = serde_json::from_str(json)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.write()?.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let data = self.read()?;
        Ok(StoreStats {
            count: data.len(),
            size_bytes: data.values().map(|json| json.len() as u64).sum(),
        })
    }
}
