//! Session statistics for the top bar.

use lcz_workbench::dataset::{Codec, LoadEvent, LoadEventKind, LoadSource};
use lcz_workbench::storage::CacheSize;

/// Counters accumulated from loader events during this session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionStats {
    /// Loads answered from the persistent cache.
    pub cache_hits: u32,
    /// Loads that had to go to the network.
    pub cache_misses: u32,
    /// Cache reads or writes that failed and were bypassed.
    pub cache_failures: u32,
    /// Compressed bytes downloaded this session.
    pub bytes_fetched: u64,
    /// Duration of the most recent completed load.
    pub last_load_ms: Option<f64>,
    /// Codec used by the most recent network load.
    pub last_codec: Option<Codec>,
    /// Last measured size of the persistent cache.
    pub cache_size: Option<CacheSize>,
}

impl SessionStats {
    /// Update stats from a loader event.
    pub fn record(&mut self, event: &LoadEvent) {
        match &event.kind {
            LoadEventKind::CacheHit => self.cache_hits += 1,
            LoadEventKind::CacheMiss => self.cache_misses += 1,
            LoadEventKind::CacheReadFailed { .. } => {
                self.cache_failures += 1;
                self.cache_misses += 1;
            }
            LoadEventKind::CacheWriteFailed { .. } => self.cache_failures += 1,
            LoadEventKind::Fetched { bytes, .. } => self.bytes_fetched += *bytes as u64,
            LoadEventKind::Decompressed { codec, .. } => self.last_codec = Some(*codec),
            LoadEventKind::Parsed { .. } => {}
            LoadEventKind::Completed { elapsed_ms, source } => {
                self.last_load_ms = Some(*elapsed_ms);
                if let LoadSource::Network { codec } = source {
                    self.last_codec = Some(*codec);
                }
            }
        }
    }

    /// Format cache size for display (e.g., "4 datasets, 150.2 MB").
    pub fn format_cache_size(&self) -> String {
        match self.cache_size {
            Some(size) => format!("{} cached, {}", size.count, format_bytes(size.size_bytes)),
            None => "—".to_string(),
        }
    }

    /// Format hit/miss counters for display.
    pub fn format_requests(&self) -> String {
        format!(
            "{} hit · {} miss · {} fetched",
            self.cache_hits,
            self.cache_misses,
            format_bytes(self.bytes_fetched)
        )
    }

    /// Format the last load for display.
    pub fn format_last_load(&self) -> String {
        match (self.last_load_ms, self.last_codec) {
            (Some(ms), Some(codec)) => format!("last: {:.0}ms ({})", ms, codec),
            (Some(ms), None) => format!("last: {:.0}ms", ms),
            _ => "—".to_string(),
        }
    }
}

/// Format bytes into a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
