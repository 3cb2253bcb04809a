//! Generic storage abstraction for persistent data.
//!
//! This module provides a platform-agnostic interface for key-value storage.
//! On WASM targets, it uses IndexedDB for persistence. Elsewhere an in-memory
//! store stands in (native development builds and tests).
//!
//! [`DatasetCache`] layers timestamped records on top of any store and is
//! what the dataset loader talks to.

mod cache;
#[cfg(target_arch = "wasm32")]
mod indexeddb;
mod memory;

pub use cache::{CacheRecord, CacheSize, DatasetCache};
#[cfg(target_arch = "wasm32")]
pub use indexeddb::IndexedDbStore;
pub use memory::MemoryStore;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;

/// Errors that can occur during storage operations.
///
/// Callers treat all of these as "cache unavailable": the data can still be
/// fetched from the network.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The database could not be opened or initialized.
    #[error("Database open failed: {0}")]
    DatabaseOpenFailed(String),
    /// A transaction failed to complete.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// An unexpected error occurred.
    #[error("Storage error: {0}")]
    Other(String),
}

/// Entry count and approximate payload size of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub count: usize,
    /// Sum of the serialized value lengths in bytes.
    pub size_bytes: u64,
}

/// A generic key-value storage interface.
///
/// Values are serialized to JSON. Each operation is atomic for its record;
/// there are no cross-record transactions.
///
/// Note: This trait does not require `Send` bounds since WASM is single-threaded
/// and JS types cannot be sent between threads.
pub trait KeyValueStore {
    /// Opens (and if needed creates) the underlying store.
    ///
    /// Idempotent. Other operations open lazily, so calling this first is
    /// only needed to surface open failures early.
    fn open(&self) -> impl Future<Output = Result<(), StorageError>>;

    /// Stores a value under the given key.
    ///
    /// If a value already exists for the key, it will be overwritten.
    fn put<T: Serialize>(&self, key: &str, value: &T)
        -> impl Future<Output = Result<(), StorageError>>;

    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, StorageError>>;

    /// Deletes a value by key.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>>;

    /// Retrieves all keys in the store.
    fn get_all_keys(&self) -> impl Future<Output = Result<Vec<String>, StorageError>>;

    /// Removes all entries from the store.
    fn clear(&self) -> impl Future<Output = Result<(), StorageError>>;

    /// Counts entries and estimates their size.
    fn stats(&self) -> impl Future<Output = Result<StoreStats, StorageError>>;
}

/// Configuration for creating a storage instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Name of the database (used as IndexedDB database name on web).
    pub database_name: String,
    /// Name of the object store within the database.
    pub store_name: String,
    /// Database version (incrementing triggers upgrade).
    pub version: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_name: "lcz-workbench".to_string(),
            store_name: "geojson-data".to_string(),
            version: 1,
        }
    }
}

impl StorageConfig {
    /// Creates a new configuration with the given database and store names.
    pub fn new(database_name: impl Into<String>, store_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            store_name: store_name.into(),
            version: 1,
        }
    }

    /// Sets the database version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}
