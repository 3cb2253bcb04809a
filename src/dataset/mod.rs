//! Dataset catalog and loading pipeline.
//!
//! - [`keys`]: which datasets exist and how they are named
//! - [`loader`]: cache, fetch, decompress, parse, cache-write
//! - [`channel`]: running loads off the UI thread

mod channel;
mod decompress;
mod keys;
mod loader;
mod transport;

pub use channel::{CacheTaskChannel, CacheTaskResult, LoadChannel, LoadOutcome, MaybeSend};
pub use decompress::{decompress, Codec, DecompressError};
pub use keys::{COMMUNE_ATTRIBUTE, DatasetKey, DatasetRequest, UnixMillis, Variant};
pub use loader::{
    DatasetLoader, EventCallback, LoadError, LoadEvent, LoadEventKind, LoadSource, Loaded,
};
#[cfg(target_arch = "wasm32")]
pub use transport::FetchTransport;
#[cfg(not(target_arch = "wasm32"))]
pub use transport::FileTransport;
pub use transport::{FetchError, Transport};

use crate::config::WorkbenchConfig;
use crate::storage::DatasetCache;

#[cfg(target_arch = "wasm32")]
pub type PlatformStore = crate::storage::IndexedDbStore;
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStore = crate::storage::MemoryStore;

#[cfg(target_arch = "wasm32")]
pub type PlatformTransport = FetchTransport;
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformTransport = FileTransport;

/// The loader used by the application on the current target.
pub type PlatformLoader = DatasetLoader<PlatformStore, PlatformTransport>;

/// Builds the application's loader from its configuration.
///
/// On the web, dataset URLs are resolved by the browser against the page, so
/// the transport needs no root. Natively, files are read relative to the
/// working directory and `data_root` is part of each request path.
pub fn platform_loader(config: &WorkbenchConfig) -> PlatformLoader {
    let store = PlatformStore::new(config.storage.clone());

    #[cfg(target_arch = "wasm32")]
    let transport = FetchTransport;
    #[cfg(not(target_arch = "wasm32"))]
    let transport = FileTransport::new(".");

    DatasetLoader::new(DatasetCache::new(store), transport)
}
