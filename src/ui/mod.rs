//! UI modules for the LCZ Workbench application.
//!
//! The UI is split into distinct panels:
//! - Top bar: Title, status, and session statistics
//! - Left panel: Page, dataset and municipality selection
//! - Central panel: Statistics tables

mod colors;
mod left_panel;
mod stats_panel;
mod top_bar;

pub use left_panel::render_left_panel;
pub use stats_panel::render_stats_panel;
pub use top_bar::render_top_bar;
