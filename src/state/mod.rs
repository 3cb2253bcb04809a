//! Application state management.
//!
//! Everything the UI reads or edits lives here, owned by the app. The
//! library components never see it.

mod stats;
mod summary;
mod view;

pub use stats::SessionStats;
pub use summary::{
    summarize_compare, summarize_icu, summarize_lcz, CompareSummary, IcuSummary, LczSummary,
    Summary, SummaryTables,
};
pub use view::{ViewMode, ViewState};

/// Root application state containing all sub-states.
#[derive(Default)]
pub struct AppState {
    /// Current page, dataset selection and municipality filter
    pub view: ViewState,

    /// Application status message displayed in top bar
    pub status_message: String,

    /// Session cache and network statistics
    pub session_stats: SessionStats,

    /// Set by the UI, consumed by the app on the next frame
    pub clear_cache_requested: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            status_message: "Ready".to_string(),
            ..Default::default()
        }
    }
}
