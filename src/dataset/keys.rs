//! Dataset identifiers.
//!
//! Every published layer is one (year, variant) pair. These types derive the
//! cache key, the file name and the attribute names for a pair so callers
//! never assemble those strings by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in milliseconds.
///
/// Compatible with JavaScript `Date.now()`, which is what the browser build
/// reads it from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixMillis(pub i64);

impl UnixMillis {
    pub fn now() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            Self(js_sys::Date::now() as i64)
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::time::{SystemTime, UNIX_EPOCH};
            let duration = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            Self(duration.as_millis() as i64)
        }
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

/// Property naming the municipality a feature belongs to.
pub const COMMUNE_ATTRIBUTE: &str = "nom_offici";

/// Which classification pipeline produced a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Rule-based GeoClimate output.
    Geoclimate,
    /// Random-forest output.
    RandomForest,
}

impl Variant {
    /// Short tag used in cache keys.
    pub fn tag(&self) -> &'static str {
        match self {
            Variant::Geoclimate => "geoclimate",
            Variant::RandomForest => "rf",
        }
    }
}

/// Identifies one published dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    pub year: u16,
    pub variant: Variant,
}

/// Where to fetch a dataset from and where to cache it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRequest {
    pub url: String,
    pub cache_key: String,
}

impl DatasetKey {
    pub const fn new(year: u16, variant: Variant) -> Self {
        Self { year, variant }
    }

    /// Every dataset the workbench ships with, oldest first.
    pub fn known() -> &'static [DatasetKey] {
        const KNOWN: [DatasetKey; 4] = [
            DatasetKey::new(2015, Variant::Geoclimate),
            DatasetKey::new(2020, Variant::Geoclimate),
            DatasetKey::new(2025, Variant::Geoclimate),
            DatasetKey::new(2025, Variant::RandomForest),
        ];
        &KNOWN
    }

    /// Storage key, e.g. `2025_rf`.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.year, self.variant.tag())
    }

    /// Compressed GeoJSON file name relative to the data root.
    pub fn file_name(&self) -> String {
        match self.variant {
            Variant::Geoclimate => format!("LCZ{}_4326.geojson.gz", self.year),
            Variant::RandomForest => format!("LCZ{}_RF_4326.geojson.gz", self.year),
        }
    }

    /// Property holding the LCZ class code.
    pub fn lcz_attribute(&self) -> &'static str {
        match self.variant {
            Variant::Geoclimate => "LCZ_PRIMAR",
            Variant::RandomForest => "LCZ",
        }
    }

    /// Property holding the heat island temperature delta.
    pub fn icu_attribute(&self) -> &'static str {
        match self.variant {
            Variant::Geoclimate => "ICU_theori",
            Variant::RandomForest => "UHI_Delta",
        }
    }

    /// Fetch location and cache key under the given data root.
    pub fn request(&self, data_root: &str) -> DatasetRequest {
        let root = data_root.trim_end_matches('/');
        let url = if root.is_empty() {
            self.file_name()
        } else {
            format!("{}/{}", root, self.file_name())
        };
        DatasetRequest {
            url,
            cache_key: self.cache_key(),
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Variant::Geoclimate => write!(f, "{}", self.year),
            Variant::RandomForest => write!(f, "{} (RF)", self.year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys() {
        let keys: Vec<String> = DatasetKey::known().iter().map(|k| k.cache_key()).collect();
        assert_eq!(
            keys,
            vec!["2015_geoclimate", "2020_geoclimate", "2025_geoclimate", "2025_rf"]
        );
    }

    #[test]
    fn test_file_names_and_attributes() {
        let geo = DatasetKey::new(2020, Variant::Geoclimate);
        assert_eq!(geo.file_name(), "LCZ2020_4326.geojson.gz");
        assert_eq!(geo.lcz_attribute(), "LCZ_PRIMAR");
        assert_eq!(geo.icu_attribute(), "ICU_theori");

        let rf = DatasetKey::new(2025, Variant::RandomForest);
        assert_eq!(rf.file_name(), "LCZ2025_RF_4326.geojson.gz");
        assert_eq!(rf.lcz_attribute(), "LCZ");
        assert_eq!(rf.icu_attribute(), "UHI_Delta");
        assert_eq!(rf.to_string(), "2025 (RF)");
    }

    #[test]
    fn test_request_joins_root() {
        let key = DatasetKey::new(2015, Variant::Geoclimate);
        assert_eq!(key.request("data/").url, "data/LCZ2015_4326.geojson.gz");
        assert_eq!(key.request("data").url, "data/LCZ2015_4326.geojson.gz");
        assert_eq!(key.request("").url, "LCZ2015_4326.geojson.gz");
        assert_eq!(key.request("data").cache_key, "2015_geoclimate");
    }

    #[test]
    fn test_unix_millis_now() {
        assert!(UnixMillis::now().as_millis() > 1_600_000_000_000);
    }
}
