//! Persistent cache of parsed datasets.
//!
//! Stores parsed feature collections so a reload does not download and
//! decompress the same file again. Records are timestamped on write and
//! last-write-wins per key. There is no eviction: records stay until
//! [`DatasetCache::clear`] or the browser purges its storage.

use super::{KeyValueStore, StorageError, StoreStats};
use crate::dataset::UnixMillis;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A stored payload with its key and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<T> {
    pub key: String,
    pub data: T,
    pub timestamp: UnixMillis,
}

/// Borrowing twin of [`CacheRecord`] used for writes.
#[derive(Serialize)]
struct CacheRecordRef<'a, T> {
    key: &'a str,
    data: &'a T,
    timestamp: UnixMillis,
}

/// Diagnostic size of the cache.
pub type CacheSize = StoreStats;

/// Cache for parsed datasets over any key-value store.
#[derive(Clone)]
pub struct DatasetCache<S> {
    store: S,
}

impl<S: KeyValueStore> DatasetCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Gets the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens the store. Safe to call repeatedly.
    pub async fn init(&self) -> Result<(), StorageError> {
        self.store.open().await
    }

    /// Returns the payload stored under `key`, or `None` on a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        Ok(self.get_record(key).await?.map(|record| record.data))
    }

    /// Returns the full record stored under `key`.
    pub async fn get_record<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<CacheRecord<T>>, StorageError> {
        self.store.get(key).await
    }

    /// Stores `data` under `key`, replacing any previous record.
    pub async fn set<T: Serialize>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        let record = CacheRecordRef {
            key,
            data,
            timestamp: UnixMillis::now(),
        };
        self.store.put(key, &record).await
    }

    /// Whether a record exists for `key`, without loading it.
    pub async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.store.get_all_keys().await?.iter().any(|k| k == key))
    }

    /// Removes every record.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.clear().await?;
        log::info!("Dataset cache cleared");
        Ok(())
    }

    /// Number of records and approximate stored size.
    pub async fn size(&self) -> Result<CacheSize, StorageError> {
        self.store.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{square_ring, Feature, FeatureCollection, Geometry, PropertyValue};
    use crate::storage::MemoryStore;
    use pollster::block_on;

    fn sample() -> FeatureCollection {
        FeatureCollection::new(vec![Feature::new(Geometry::Polygon(vec![square_ring(
            7.4, 48.9, 0.01,
        )]))
        .with_property("LCZ_PRIMAR", PropertyValue::Number(6.0))
        .with_property("nom_offici", PropertyValue::Text("Bitche".into()))])
    }

    #[test]
    fn test_round_trip() {
        let cache = DatasetCache::new(MemoryStore::default());
        block_on(async {
            cache.init().await.unwrap();
            cache.set("2020_geoclimate", &sample()).await.unwrap();

            let loaded: Option<FeatureCollection> = cache.get("2020_geoclimate").await.unwrap();
            assert_eq!(loaded, Some(sample()));
        });
    }

    #[test]
    fn test_miss_is_none() {
        let cache = DatasetCache::new(MemoryStore::default());
        block_on(async {
            let loaded: Option<FeatureCollection> = cache.get("nope").await.unwrap();
            assert!(loaded.is_none());
            assert!(!cache.contains("nope").await.unwrap());
        });
    }

    #[test]
    fn test_last_write_wins() {
        let cache = DatasetCache::new(MemoryStore::default());
        block_on(async {
            cache.set("k", &1u32).await.unwrap();
            cache.set("k", &2u32).await.unwrap();

            let record: CacheRecord<u32> = cache.get_record("k").await.unwrap().unwrap();
            assert_eq!(record.key, "k");
            assert_eq!(record.data, 2);
            assert!(record.timestamp.as_millis() > 0);
            assert_eq!(cache.size().await.unwrap().count, 1);
        });
    }

    #[test]
    fn test_clear_and_size() {
        let cache = DatasetCache::new(MemoryStore::default());
        block_on(async {
            cache.set("a", &sample()).await.unwrap();
            cache.set("b", &sample()).await.unwrap();

            let size = cache.size().await.unwrap();
            assert_eq!(size.count, 2);
            assert!(size.size_bytes > 0);
            assert!(cache.contains("a").await.unwrap());

            cache.clear().await.unwrap();
            assert_eq!(cache.size().await.unwrap().count, 0);
        });
    }
}
