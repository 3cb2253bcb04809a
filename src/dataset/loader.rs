//! Cache-first dataset loading.
//!
//! The load pipeline:
//! 1. Look the cache key up in the [`DatasetCache`]; a hit returns at once
//! 2. Fetch the compressed file through the [`Transport`]
//! 3. Decompress (gzip, falling back to zlib and raw deflate)
//! 4. Parse the GeoJSON into a [`FeatureCollection`]
//! 5. Write the parsed collection back to the cache
//!
//! Cache failures in steps 1 and 5 are logged and bypassed; the dataset is
//! still served from the network. Every step is reported as a [`LoadEvent`]
//! to an optional observer.

use super::decompress::{decompress, Codec, DecompressError};
use super::keys::DatasetRequest;
use super::transport::{FetchError, Transport};
use crate::geo::FeatureCollection;
use crate::storage::{DatasetCache, KeyValueStore, StorageError};
use std::sync::Arc;
use std::time::Duration;

/// Why a dataset could not be loaded.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decompression(#[from] DecompressError),
    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },
    /// Only produced by explicit cache operations, never by `load`.
    #[error("Cache unavailable: {0}")]
    Cache(#[from] StorageError),
}

/// Where a loaded collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Network { codec: Codec },
}

/// One step of a load, as reported to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent {
    pub cache_key: String,
    pub kind: LoadEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadEventKind {
    CacheHit,
    CacheMiss,
    CacheReadFailed { message: String },
    Fetched { bytes: usize, elapsed_ms: f64 },
    Decompressed { codec: Codec, bytes: usize },
    Parsed { features: usize },
    CacheWriteFailed { message: String },
    Completed { source: LoadSource, elapsed_ms: f64 },
}

/// Observer invoked for every [`LoadEvent`].
pub type EventCallback = Arc<dyn Fn(&LoadEvent) + Send + Sync>;

/// A loaded collection and its provenance.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub collection: FeatureCollection,
    pub source: LoadSource,
}

/// Loads datasets through the cache.
///
/// Holds no per-load state, so one loader (or clones of it) can serve any
/// number of concurrent loads. Concurrent loads of the same key are not
/// coalesced; each may fetch and write the cache.
#[derive(Clone)]
pub struct DatasetLoader<S, T> {
    cache: DatasetCache<S>,
    transport: T,
    observer: Option<EventCallback>,
}

impl<S: KeyValueStore, T: Transport> DatasetLoader<S, T> {
    pub fn new(cache: DatasetCache<S>, transport: T) -> Self {
        Self {
            cache,
            transport,
            observer: None,
        }
    }

    /// Registers an observer for load events.
    pub fn with_observer(mut self, observer: EventCallback) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn cache(&self) -> &DatasetCache<S> {
        &self.cache
    }

    /// Loads the dataset at `url`, using `cache_key` for the cache.
    pub async fn load(&self, url: &str, cache_key: &str) -> Result<FeatureCollection, LoadError> {
        Ok(self.load_with_source(url, cache_key).await?.collection)
    }

    /// Same as [`load`](Self::load), also reporting where the data came from.
    pub async fn load_with_source(&self, url: &str, cache_key: &str) -> Result<Loaded, LoadError> {
        let start = web_time::Instant::now();

        match self.cache.get::<FeatureCollection>(cache_key).await {
            Ok(Some(collection)) => {
                log::info!("Cache hit for {}", cache_key);
                self.emit(cache_key, LoadEventKind::CacheHit);
                self.emit(
                    cache_key,
                    LoadEventKind::Completed {
                        source: LoadSource::Cache,
                        elapsed_ms: elapsed_ms(start),
                    },
                );
                return Ok(Loaded {
                    collection,
                    source: LoadSource::Cache,
                });
            }
            Ok(None) => {
                log::info!("Cache miss for {}", cache_key);
                self.emit(cache_key, LoadEventKind::CacheMiss);
            }
            Err(e) => {
                log::warn!("Cache lookup failed for {}: {}", cache_key, e);
                self.emit(
                    cache_key,
                    LoadEventKind::CacheReadFailed {
                        message: e.to_string(),
                    },
                );
            }
        }

        let bytes = self.transport.fetch(url).await?;
        log::info!("Fetched {} ({} bytes)", url, bytes.len());
        self.emit(
            cache_key,
            LoadEventKind::Fetched {
                bytes: bytes.len(),
                elapsed_ms: elapsed_ms(start),
            },
        );

        let (decoded, codec) = decompress(&bytes)?;
        log::info!("Decompressed {} with {}", url, codec);
        self.emit(
            cache_key,
            LoadEventKind::Decompressed {
                codec,
                bytes: decoded.len(),
            },
        );

        let text = String::from_utf8(decoded).map_err(|e| LoadError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let collection =
            FeatureCollection::from_geojson_str(&text).map_err(|e| LoadError::Parse {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        log::info!("Parsed {} features from {}", collection.len(), url);
        self.emit(
            cache_key,
            LoadEventKind::Parsed {
                features: collection.len(),
            },
        );

        if let Err(e) = self.cache.set(cache_key, &collection).await {
            log::warn!("Failed to cache {}: {}", cache_key, e);
            self.emit(
                cache_key,
                LoadEventKind::CacheWriteFailed {
                    message: e.to_string(),
                },
            );
        }

        let source = LoadSource::Network { codec };
        self.emit(
            cache_key,
            LoadEventKind::Completed {
                source,
                elapsed_ms: elapsed_ms(start),
            },
        );

        Ok(Loaded { collection, source })
    }

    /// Warms the cache with the given datasets, one at a time.
    ///
    /// Datasets already cached are skipped. Successive loads are separated by
    /// `gap`. Failures are logged and do not stop the remaining requests.
    /// Returns how many datasets were loaded.
    pub async fn preload(&self, requests: &[DatasetRequest], gap: Duration) -> usize {
        let mut loaded = 0;
        let mut attempted = false;

        for request in requests {
            match self.cache.contains(&request.cache_key).await {
                Ok(true) => {
                    log::debug!("Preload skipping cached {}", request.cache_key);
                    continue;
                }
                Ok(false) => {}
                Err(e) => log::warn!("Preload cache check failed: {}", e),
            }

            if attempted && !gap.is_zero() {
                sleep(gap).await;
            }
            attempted = true;

            match self.load(&request.url, &request.cache_key).await {
                Ok(_) => {
                    log::info!("Preloaded {}", request.cache_key);
                    loaded += 1;
                }
                Err(e) => log::warn!("Preload of {} failed: {}", request.cache_key, e),
            }
        }

        loaded
    }

    fn emit(&self, cache_key: &str, kind: LoadEventKind) {
        if let Some(observer) = &self.observer {
            observer(&LoadEvent {
                cache_key: cache_key.to_string(),
                kind,
            });
        }
    }
}

fn elapsed_ms(start: web_time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(target_arch = "wasm32")]
async fn sleep(duration: Duration) {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_name = setTimeout)]
        fn set_timeout(closure: &Closure<dyn FnMut()>, millis: u32) -> i32;
    }

    let (tx, rx) = futures_channel::oneshot::channel::<()>();
    let closure = Closure::once(move || {
        let _ = tx.send(());
    });
    set_timeout(&closure, duration.as_millis().min(u32::MAX as u128) as u32);
    let _ = rx.await;
}

/// Natively preloads run on their own thread, so blocking it is fine.
#[cfg(not(target_arch = "wasm32"))]
async fn sleep(duration: Duration) {
    std::thread::sleep(duration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::PropertyValue;
    use crate::storage::{MemoryStore, StoreStats};
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use pollster::block_on;
    use serde::{de::DeserializeOwned, Serialize};
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[7.4, 48.9], [7.41, 48.9], [7.41, 48.91], [7.4, 48.91], [7.4, 48.9]]]
            },
            "properties": { "LCZ_PRIMAR": 6, "nom_offici": "Bitche" }
        }]
    }"#;

    /// Serves fixed responses and counts fetches.
    #[derive(Clone, Default)]
    struct StubTransport {
        files: Arc<HashMap<String, Vec<u8>>>,
        calls: Arc<AtomicUsize>,
    }

    impl StubTransport {
        fn with_file(url: &str, bytes: Vec<u8>) -> Self {
            Self {
                files: Arc::new(HashMap::from([(url.to_string(), bytes)])),
                calls: Arc::default(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for StubTransport {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.files.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// A store that is always unavailable.
    #[derive(Clone)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        async fn open(&self) -> Result<(), StorageError> {
            Err(StorageError::DatabaseOpenFailed("blocked".into()))
        }
        async fn put<V: Serialize>(&self, _key: &str, _value: &V) -> Result<(), StorageError> {
            Err(StorageError::DatabaseOpenFailed("blocked".into()))
        }
        async fn get<V: DeserializeOwned>(&self, _key: &str) -> Result<Option<V>, StorageError> {
            Err(StorageError::DatabaseOpenFailed("blocked".into()))
        }
        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::DatabaseOpenFailed("blocked".into()))
        }
        async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::DatabaseOpenFailed("blocked".into()))
        }
        async fn clear(&self) -> Result<(), StorageError> {
            Err(StorageError::DatabaseOpenFailed("blocked".into()))
        }
        async fn stats(&self) -> Result<StoreStats, StorageError> {
            Err(StorageError::DatabaseOpenFailed("blocked".into()))
        }
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn loader(transport: StubTransport) -> DatasetLoader<MemoryStore, StubTransport> {
        DatasetLoader::new(DatasetCache::new(MemoryStore::default()), transport)
    }

    #[test]
    fn test_miss_fetches_and_caches() {
        let transport = StubTransport::with_file("a.gz", gzip(GEOJSON.as_bytes()));
        let loader = loader(transport.clone());

        block_on(async {
            let loaded = loader.load_with_source("a.gz", "2020_geoclimate").await.unwrap();
            assert_eq!(loaded.collection.len(), 1);
            assert_eq!(loaded.source, LoadSource::Network { codec: Codec::Gzip });
            assert_eq!(
                loaded.collection.features[0].attribute("nom_offici"),
                Some(&PropertyValue::Text("Bitche".into()))
            );

            let cached: Option<FeatureCollection> =
                loader.cache().get("2020_geoclimate").await.unwrap();
            assert_eq!(cached, Some(loaded.collection));
        });
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_hit_skips_network() {
        let transport = StubTransport::with_file("a.gz", gzip(GEOJSON.as_bytes()));
        let loader = loader(transport.clone());

        block_on(async {
            let first = loader.load("a.gz", "k").await.unwrap();
            let second = loader.load_with_source("a.gz", "k").await.unwrap();
            assert_eq!(second.source, LoadSource::Cache);
            assert_eq!(second.collection, first);
        });
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_prepopulated_cache_never_fetches() {
        let transport = StubTransport::default();
        let loader = loader(transport.clone());
        let expected = FeatureCollection::from_geojson_str(GEOJSON).unwrap();

        block_on(async {
            loader.cache().set("k", &expected).await.unwrap();
            assert_eq!(loader.load("missing.gz", "k").await.unwrap(), expected);
        });
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_fallback_codecs_still_parse() {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(GEOJSON.as_bytes()).unwrap();
        let mut raw = DeflateEncoder::new(Vec::new(), Compression::best());
        raw.write_all(GEOJSON.as_bytes()).unwrap();

        for (bytes, codec) in [
            (zlib.finish().unwrap(), Codec::Zlib),
            (raw.finish().unwrap(), Codec::Deflate),
        ] {
            let loader = loader(StubTransport::with_file("a.gz", bytes));
            let loaded = block_on(loader.load_with_source("a.gz", "k")).unwrap();
            assert_eq!(loaded.source, LoadSource::Network { codec });
            assert_eq!(loaded.collection.len(), 1);
        }
    }

    #[test]
    fn test_fetch_error() {
        let loader = loader(StubTransport::default());
        let err = block_on(loader.load("nope.gz", "k")).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_decompression_error() {
        let loader = loader(StubTransport::with_file("a.gz", vec![0xFF; 64]));
        let err = block_on(loader.load("a.gz", "k")).unwrap_err();
        assert!(matches!(err, LoadError::Decompression(_)));
    }

    #[test]
    fn test_parse_error_is_not_cached() {
        let loader = loader(StubTransport::with_file("a.gz", gzip(b"{ not json")));
        block_on(async {
            let err = loader.load("a.gz", "k").await.unwrap_err();
            assert!(matches!(err, LoadError::Parse { .. }));
            assert!(!loader.cache().contains("k").await.unwrap());
        });
    }

    #[test]
    fn test_broken_cache_is_bypassed() {
        let transport = StubTransport::with_file("a.gz", gzip(GEOJSON.as_bytes()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let loader = DatasetLoader::new(DatasetCache::new(BrokenStore), transport.clone())
            .with_observer(Arc::new(move |event: &LoadEvent| {
                sink.lock().unwrap().push(event.kind.clone());
            }));

        let collection = block_on(loader.load("a.gz", "k")).unwrap();
        assert_eq!(collection.len(), 1);

        let events = events.lock().unwrap();
        assert!(matches!(events[0], LoadEventKind::CacheReadFailed { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, LoadEventKind::CacheWriteFailed { .. })));
    }

    #[test]
    fn test_event_sequence() {
        let transport = StubTransport::with_file("a.gz", gzip(GEOJSON.as_bytes()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let loader = loader(transport).with_observer(Arc::new(move |event: &LoadEvent| {
            sink.lock().unwrap().push(event.clone());
        }));

        block_on(async {
            loader.load("a.gz", "2015_geoclimate").await.unwrap();
            loader.load("a.gz", "2015_geoclimate").await.unwrap();
        });

        let events = events.lock().unwrap();
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e.kind {
                LoadEventKind::CacheHit => "hit",
                LoadEventKind::CacheMiss => "miss",
                LoadEventKind::CacheReadFailed { .. } => "read-failed",
                LoadEventKind::Fetched { .. } => "fetched",
                LoadEventKind::Decompressed { .. } => "decompressed",
                LoadEventKind::Parsed { .. } => "parsed",
                LoadEventKind::CacheWriteFailed { .. } => "write-failed",
                LoadEventKind::Completed { .. } => "completed",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["miss", "fetched", "decompressed", "parsed", "completed", "hit", "completed"]
        );
        assert!(events.iter().all(|e| e.cache_key == "2015_geoclimate"));
    }

    #[test]
    fn test_preload_skips_cached_and_survives_failures() {
        let transport = StubTransport::with_file("b.gz", gzip(GEOJSON.as_bytes()));
        let loader = loader(transport.clone());
        let requests = [
            DatasetRequest {
                url: "a.gz".into(),
                cache_key: "a".into(),
            },
            DatasetRequest {
                url: "missing.gz".into(),
                cache_key: "missing".into(),
            },
            DatasetRequest {
                url: "b.gz".into(),
                cache_key: "b".into(),
            },
        ];

        block_on(async {
            loader
                .cache()
                .set("a", &FeatureCollection::default())
                .await
                .unwrap();

            assert_eq!(loader.preload(&requests, Duration::ZERO).await, 1);
            assert!(loader.cache().contains("b").await.unwrap());

            // Everything loadable is now cached
            assert_eq!(loader.preload(&requests, Duration::ZERO).await, 0);
        });
        // "a" skipped; "missing" tried twice; "b" fetched once
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn test_preload_pauses_between_loads() {
        let transport = StubTransport::with_file("a.gz", gzip(GEOJSON.as_bytes()));
        let loader = loader(transport);
        let requests = [
            DatasetRequest {
                url: "a.gz".into(),
                cache_key: "first".into(),
            },
            DatasetRequest {
                url: "a.gz".into(),
                cache_key: "second".into(),
            },
        ];

        let gap = Duration::from_millis(30);
        let start = std::time::Instant::now();
        assert_eq!(block_on(loader.preload(&requests, gap)), 2);
        assert!(start.elapsed() >= gap);

        // Nothing left to load, so no pause either
        let start = std::time::Instant::now();
        assert_eq!(block_on(loader.preload(&requests, Duration::from_secs(5))), 0);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    fn gzip_document(text: &str) -> StubTransport {
        StubTransport::with_file("a.gz", gzip(text.as_bytes()))
    }

    #[test]
    fn test_non_object_properties_do_not_fail_the_load() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"LCZ_PRIMAR": 6},
             "geometry": {"type": "Polygon", "coordinates": [[[7.4, 48.9], [7.41, 48.9], [7.41, 48.91], [7.4, 48.9]]]}},
            {"type": "Feature", "properties": "oops",
             "geometry": {"type": "Polygon", "coordinates": [[[7.5, 48.9], [7.51, 48.9], [7.51, 48.91], [7.5, 48.9]]]}}
        ]}"#;
        let loader = loader(gzip_document(text));

        block_on(async {
            let collection = loader.load("a.gz", "k").await.unwrap();
            assert_eq!(collection.len(), 2);
            assert!(collection.features[1].properties.is_none());
            assert!(loader.cache().contains("k").await.unwrap());
        });
    }

    #[test]
    fn test_missing_geometry_does_not_fail_the_load() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"LCZ_PRIMAR": 6}}
        ]}"#;
        let loader = loader(gzip_document(text));

        let collection = block_on(loader.load("a.gz", "k")).unwrap();
        assert_eq!(collection.len(), 1);
        assert!(collection.features[0].geometry.is_none());
    }

    #[test]
    fn test_short_position_does_not_fail_the_load() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"LCZ_PRIMAR": 6},
             "geometry": {"type": "Polygon", "coordinates": [[[7.4, 48.9], [7.4], [7.41, 48.9], [7.41, 48.91], [7.4, 48.9]]]}}
        ]}"#;
        let loader = loader(gzip_document(text));

        let collection = block_on(loader.load("a.gz", "k")).unwrap();
        match &collection.features[0].geometry {
            Some(crate::geo::Geometry::Polygon(rings)) => assert_eq!(rings[0].len(), 4),
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}
