//! Browser persistence for the dataset cache.
//!
//! Each value is a JSON string stored under an explicit key in a single
//! IndexedDB object store. Request callbacks are bridged to futures through
//! oneshot channels.

use super::{KeyValueStore, StorageConfig, StorageError, StoreStats};
use js_sys::Array;
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{IdbDatabase, IdbObjectStore, IdbOpenDbRequest, IdbRequest, IdbTransactionMode};

/// Key-value store over one IndexedDB object store.
///
/// Clones share the same database handle, so parallel dataset loads reuse a
/// single connection once it is open.
#[derive(Clone)]
pub struct IndexedDbStore {
    config: StorageConfig,
    db: Rc<RefCell<Option<IdbDatabase>>>,
}

impl IndexedDbStore {
    /// Creates a new IndexedDB store with the given configuration.
    ///
    /// Note: The database is opened lazily on first use.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: Rc::new(RefCell::new(None)),
        }
    }

    /// Opens the database connection if not already open.
    async fn ensure_open(&self) -> Result<(), StorageError> {
        if self.db.borrow().is_some() {
            return Ok(());
        }

        let db = open_database(&self.config).await?;

        // A concurrent caller may have finished opening first; keep theirs
        let mut slot = self.db.borrow_mut();
        if slot.is_none() {
            *slot = Some(db);
        } else {
            db.close();
        }
        Ok(())
    }

    /// Gets the database reference, opening it if necessary.
    async fn get_db(&self) -> Result<IdbDatabase, StorageError> {
        self.ensure_open().await?;
        self.db
            .borrow()
            .clone()
            .ok_or_else(|| StorageError::DatabaseOpenFailed("Database not open".to_string()))
    }

    /// Runs one request against the object store and waits for its result.
    async fn run(
        &self,
        mode: IdbTransactionMode,
        op: impl FnOnce(&IdbObjectStore) -> Result<IdbRequest, JsValue>,
    ) -> Result<JsValue, StorageError> {
        let db = self.get_db().await?;
        let store = db
            .transaction_with_str_and_mode(&self.config.store_name, mode)
            .and_then(|tx| tx.object_store(&self.config.store_name))
            .map_err(transaction_error)?;
        let request = op(&store).map_err(transaction_error)?;
        wait_for_request(&request).await
    }
}

fn transaction_error(e: JsValue) -> StorageError {
    StorageError::TransactionFailed(format!("{:?}", e))
}

impl KeyValueStore for IndexedDbStore {
    async fn open(&self) -> Result<(), StorageError> {
        self.ensure_open().await
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        self.run(IdbTransactionMode::Readwrite, |store| {
            store.put_with_key(&JsValue::from_str(&json), &JsValue::from_str(key))
        })
        .await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let result = self
            .run(IdbTransactionMode::Readonly, |store| {
                store.get(&JsValue::from_str(key))
            })
            .await?;

        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }

        let json = result
            .as_string()
            .ok_or_else(|| StorageError::SerializationError("Expected string value".to_string()))?;

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.run(IdbTransactionMode::Readwrite, |store| {
            store.delete(&JsValue::from_str(key))
        })
        .await?;
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = self
            .run(IdbTransactionMode::Readonly, IdbObjectStore::get_all_keys)
            .await?;

        Ok(Array::from(&keys)
            .iter()
            .filter_map(|key| key.as_string())
            .collect())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.run(IdbTransactionMode::Readwrite, IdbObjectStore::clear)
            .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let values = self
            .run(IdbTransactionMode::Readonly, IdbObjectStore::get_all)
            .await?;
        let values = Array::from(&values);

        // Values are JSON strings; UTF-16 length is close enough for a diagnostic
        let size_bytes = values
            .iter()
            .filter_map(|value| value.dyn_into::<js_sys::JsString>().ok())
            .map(|s| s.length() as u64)
            .sum();

        Ok(StoreStats {
            count: values.length() as usize,
            size_bytes,
        })
    }
}

/// Opens an IndexedDB database with the given configuration.
///
/// Object store creation happens in the version upgrade handler, which
/// IndexedDB runs at most once per version even when several opens race.
///
/// An open that is blocked by a connection elsewhere (another tab still on
/// an older version) fails at once instead of waiting for that tab to close.
async fn open_database(config: &StorageConfig) -> Result<IdbDatabase, StorageError> {
    let window = web_sys::window()
        .ok_or_else(|| StorageError::DatabaseOpenFailed("No window object".to_string()))?;

    let idb_factory = window
        .indexed_db()
        .map_err(|e| StorageError::DatabaseOpenFailed(format!("{:?}", e)))?
        .ok_or_else(|| StorageError::DatabaseOpenFailed("IndexedDB not available".to_string()))?;

    let open_request = idb_factory
        .open_with_u32(&config.database_name, config.version)
        .map_err(|e| StorageError::DatabaseOpenFailed(format!("{:?}", e)))?;

    let store_name = config.store_name.clone();
    let onupgradeneeded = Closure::wrap(Box::new(move |event: web_sys::IdbVersionChangeEvent| {
        let db = event
            .target()
            .and_then(|target| target.dyn_into::<IdbRequest>().ok())
            .and_then(|request| request.result().ok())
            .and_then(|result| result.dyn_into::<IdbDatabase>().ok());

        let Some(db) = db else {
            log::error!("IndexedDB upgrade event without a database");
            return;
        };

        if !db.object_store_names().contains(&store_name) {
            let params = web_sys::IdbObjectStoreParameters::new();
            // Explicit keys, so no keyPath
            match db.create_object_store_with_optional_parameters(&store_name, &params) {
                Ok(_) => log::info!("Created IndexedDB object store: {}", store_name),
                Err(e) => log::error!("Failed to create object store {}: {:?}", store_name, e),
            }
        }
    }) as Box<dyn FnMut(_)>);

    open_request.set_onupgradeneeded(Some(onupgradeneeded.as_ref().unchecked_ref()));

    let db_result = wait_for_open(&open_request).await;

    open_request.set_onupgradeneeded(None);
    drop(onupgradeneeded);

    let db: IdbDatabase = db_result?.dyn_into().map_err(|_| {
        StorageError::DatabaseOpenFailed("Failed to cast to IdbDatabase".to_string())
    })?;

    log::info!(
        "Opened IndexedDB database: {} v{}",
        config.database_name,
        config.version
    );

    Ok(db)
}

/// Waits for an open request, treating a `blocked` event as a failure.
async fn wait_for_open(request: &IdbOpenDbRequest) -> Result<JsValue, StorageError> {
    let result = settle(request, Some(request), StorageError::DatabaseOpenFailed).await;

    if matches!(result, Err(StorageError::DatabaseOpenFailed(_))) {
        // The request may still succeed once the other connection goes away;
        // close that late connection so it does not hold the version.
        let late = request.clone();
        let close_late = Closure::once_into_js(move |_event: web_sys::Event| {
            if let Some(db) = late
                .result()
                .ok()
                .and_then(|result| result.dyn_into::<IdbDatabase>().ok())
            {
                db.close();
            }
        });
        request.set_onsuccess(Some(close_late.unchecked_ref()));
    }

    result
}

/// Waits for an IDB request to complete and returns the result.
async fn wait_for_request(request: &IdbRequest) -> Result<JsValue, StorageError> {
    settle(request, None, StorageError::TransactionFailed).await
}

/// Bridges the request callbacks to a future. `failure` wraps the error
/// message of an `error` (or `blocked`) event.
async fn settle(
    request: &IdbRequest,
    open: Option<&IdbOpenDbRequest>,
    failure: fn(String) -> StorageError,
) -> Result<JsValue, StorageError> {
    let (tx, rx) = futures_channel::oneshot::channel::<Result<JsValue, StorageError>>();
    let tx = Rc::new(RefCell::new(Some(tx)));

    let tx_success = tx.clone();
    let success_request = request.clone();
    let onsuccess = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        let result = success_request.result().unwrap_or(JsValue::UNDEFINED);

        if let Some(tx) = tx_success.borrow_mut().take() {
            let _ = tx.send(Ok(result));
        }
    }) as Box<dyn FnMut(_)>);

    let tx_error = tx.clone();
    let error_request = request.clone();
    let onerror = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        let error_msg = error_request
            .error()
            .ok()
            .flatten()
            .map(|e| e.message())
            .unwrap_or_else(|| "Unknown error".to_string());

        if let Some(tx) = tx_error.borrow_mut().take() {
            let _ = tx.send(Err(failure(error_msg)));
        }
    }) as Box<dyn FnMut(_)>);

    let tx_blocked = tx;
    let onblocked = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        log::warn!("IndexedDB open blocked by another connection");
        if let Some(tx) = tx_blocked.borrow_mut().take() {
            let _ = tx.send(Err(failure(
                "blocked by a connection in another tab".to_string(),
            )));
        }
    }) as Box<dyn FnMut(_)>);

    request.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
    request.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    if let Some(open) = open {
        open.set_onblocked(Some(onblocked.as_ref().unchecked_ref()));
    }

    // Keep closures alive until the request completes
    let result = rx
        .await
        .map_err(|_| StorageError::Other("Channel closed".to_string()))?;

    request.set_onsuccess(None);
    request.set_onerror(None);
    if let Some(open) = open {
        open.set_onblocked(None);
    }

    drop(onsuccess);
    drop(onerror);
    drop(onblocked);

    result
}
