//! Workbench configuration.
//!
//! On the web the configuration is persisted to localStorage so it survives
//! page reloads. Natively only the data root can be overridden, through the
//! `LCZ_WORKBENCH_DATA` environment variable.

use crate::dataset::{DatasetKey, DatasetRequest};
use crate::stats::RangeScheme;
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Directory (or URL prefix) holding the compressed dataset files.
    pub data_root: String,
    pub storage: StorageConfig,
    /// How long after startup to begin preloading the other datasets.
    pub preload_delay_ms: u64,
    /// Pause between two preloaded datasets, leaving the network to
    /// interactive loads.
    pub preload_gap_ms: u64,
    /// Buckets used for the heat island statistics.
    pub icu_ranges: RangeScheme,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            data_root: "data".to_string(),
            storage: StorageConfig::default(),
            preload_delay_ms: 3000,
            preload_gap_ms: 1000,
            icu_ranges: RangeScheme::icu_default(),
        }
    }
}

impl WorkbenchConfig {
    /// localStorage key for persisting the configuration.
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "lcz_workbench_config";

    /// Environment variable overriding the data root.
    #[cfg(not(target_arch = "wasm32"))]
    pub const DATA_ROOT_VAR: &'static str = "LCZ_WORKBENCH_DATA";

    /// Fetch location and cache key for a dataset.
    pub fn request(&self, key: &DatasetKey) -> DatasetRequest {
        key.request(&self.data_root)
    }

    /// Parses a configuration, falling back to defaults for missing fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the configuration from localStorage.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let window = match web_sys::window() {
            Some(w) => w,
            None => return Self::default(),
        };

        let storage = match window.local_storage() {
            Ok(Some(s)) => s,
            _ => return Self::default(),
        };

        let json = match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(s)) => s,
            _ => return Self::default(),
        };

        match Self::from_json(&json) {
            Ok(config) => {
                log::info!("Loaded workbench config from localStorage");
                config
            }
            Err(e) => {
                log::warn!("Failed to parse workbench config: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from the environment.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(Self::DATA_ROOT_VAR) {
            log::info!("Using data root {}", root);
            config.data_root = root;
        }
        config
    }

    /// Save the configuration to localStorage.
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let window = match web_sys::window() {
            Some(w) => w,
            None => return,
        };

        let storage = match window.local_storage() {
            Ok(Some(s)) => s,
            _ => return,
        };

        let json = match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Failed to serialize workbench config: {}", e);
                return;
            }
        };

        if let Err(e) = storage.set_item(Self::STORAGE_KEY, &json) {
            log::warn!("Failed to save workbench config: {:?}", e);
        } else {
            log::info!("Saved workbench config to localStorage");
        }
    }

    /// Native builds have nowhere to persist to.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}
