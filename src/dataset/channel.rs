//! Background execution for loads and cache maintenance.
//!
//! Loads are async but egui's `update()` is synchronous. These channels run
//! the work elsewhere (a `spawn_local` task on the web, a thread driven by
//! `pollster` natively) and hand results back through an mpsc channel that
//! the UI polls each frame. A background load goes through exactly the same
//! [`DatasetLoader::load_with_source`] as a direct call.

use super::keys::DatasetRequest;
use super::loader::{DatasetLoader, LoadError, Loaded};
use super::transport::Transport;
use crate::storage::{CacheSize, KeyValueStore, StorageError};
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

/// `Send` on native targets, where work runs on another thread; no bound on
/// the web, where everything stays on the main thread.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

/// Runs the future produced by `make` to completion in the background.
#[cfg(not(target_arch = "wasm32"))]
fn spawn_detached<F, Fut>(make: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    std::thread::spawn(move || pollster::block_on(make()));
}

#[cfg(target_arch = "wasm32")]
fn spawn_detached<F, Fut>(make: F)
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(make());
}

/// A finished background load, tagged by the caller.
#[derive(Debug)]
pub struct LoadOutcome<K> {
    pub tag: K,
    pub cache_key: String,
    pub result: Result<Loaded, LoadError>,
}

/// Channel-based runner for dataset loads.
pub struct LoadChannel<K> {
    sender: Sender<LoadOutcome<K>>,
    receiver: Receiver<LoadOutcome<K>>,
}

impl<K> Default for LoadChannel<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LoadChannel<K> {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    /// Starts loading `request` in the background.
    ///
    /// `notify` runs after the outcome has been queued, typically to request
    /// a repaint.
    pub fn request<S, T>(
        &self,
        loader: DatasetLoader<S, T>,
        tag: K,
        request: DatasetRequest,
        notify: impl FnOnce() + MaybeSend + 'static,
    ) where
        K: MaybeSend + 'static,
        S: KeyValueStore + MaybeSend + 'static,
        T: Transport + MaybeSend + 'static,
    {
        let sender = self.sender.clone();

        spawn_detached(move || async move {
            let result = loader
                .load_with_source(&request.url, &request.cache_key)
                .await;
            let _ = sender.send(LoadOutcome {
                tag,
                cache_key: request.cache_key,
                result,
            });
            notify();
        });
    }

    /// Non-blocking check for a completed load.
    pub fn try_recv(&self) -> Option<LoadOutcome<K>> {
        self.receiver.try_recv().ok()
    }
}

/// Result of a background cache task.
#[derive(Debug)]
pub enum CacheTaskResult {
    Cleared(Result<(), StorageError>),
    Size(Result<CacheSize, StorageError>),
    /// Number of datasets newly loaded by a preload.
    Preloaded(usize),
}

/// Channel-based runner for cache maintenance and preloading.
pub struct CacheTaskChannel {
    sender: Sender<CacheTaskResult>,
    receiver: Receiver<CacheTaskResult>,
}

impl Default for CacheTaskChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheTaskChannel {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    /// Clears the cache, then reports its new size.
    pub fn clear<S, T>(
        &self,
        loader: DatasetLoader<S, T>,
        notify: impl FnOnce() + MaybeSend + 'static,
    ) where
        S: KeyValueStore + MaybeSend + 'static,
        T: Transport + MaybeSend + 'static,
    {
        let sender = self.sender.clone();

        spawn_detached(move || async move {
            let _ = sender.send(CacheTaskResult::Cleared(loader.cache().clear().await));
            let _ = sender.send(CacheTaskResult::Size(loader.cache().size().await));
            notify();
        });
    }

    /// Measures the cache.
    pub fn size<S, T>(
        &self,
        loader: DatasetLoader<S, T>,
        notify: impl FnOnce() + MaybeSend + 'static,
    ) where
        S: KeyValueStore + MaybeSend + 'static,
        T: Transport + MaybeSend + 'static,
    {
        let sender = self.sender.clone();

        spawn_detached(move || async move {
            let _ = sender.send(CacheTaskResult::Size(loader.cache().size().await));
            notify();
        });
    }

    /// Preloads `requests` one after another, `gap` apart, then reports the
    /// cache size.
    pub fn preload<S, T>(
        &self,
        loader: DatasetLoader<S, T>,
        requests: Vec<DatasetRequest>,
        gap: Duration,
        notify: impl FnOnce() + MaybeSend + 'static,
    ) where
        S: KeyValueStore + MaybeSend + 'static,
        T: Transport + MaybeSend + 'static,
    {
        let sender = self.sender.clone();

        spawn_detached(move || async move {
            log::info!("Preloading {} dataset(s)", requests.len());
            let loaded = loader.preload(&requests, gap).await;
            let _ = sender.send(CacheTaskResult::Preloaded(loaded));
            let _ = sender.send(CacheTaskResult::Size(loader.cache().size().await));
            notify();
        });
    }

    /// Non-blocking check for a completed task.
    pub fn try_recv(&self) -> Option<CacheTaskResult> {
        self.receiver.try_recv().ok()
    }
}
