//! Centralized color constants for the UI.

use eframe::egui::Color32;
use lcz_workbench::lcz;

/// General UI colors for labels and values.
pub mod ui {
    use super::Color32;

    /// Muted gray for stat labels.
    pub const LABEL: Color32 = Color32::from_rgb(100, 100, 100);
    /// Slightly brighter for stat values.
    pub const VALUE: Color32 = Color32::from_rgb(160, 160, 160);
    /// Emphasized color for active states.
    pub const ACTIVE: Color32 = Color32::from_rgb(100, 180, 255);
    /// Warnings such as an unapplied filter.
    pub const WARNING: Color32 = Color32::from_rgb(255, 180, 50);
    /// Area gained between two datasets.
    pub const GAIN: Color32 = Color32::from_rgb(100, 200, 100);
    /// Area lost between two datasets.
    pub const LOSS: Color32 = Color32::from_rgb(255, 80, 80);
}

/// Converts a `#rrggbb` class colour, falling back to the unclassified gray.
pub fn from_hex(hex: &str) -> Color32 {
    let [r, g, b] = lcz::parse_hex(hex)
        .or_else(|| lcz::parse_hex(lcz::UNCLASSIFIED_HEX))
        .unwrap_or([204, 204, 204]);
    Color32::from_rgb(r, g, b)
}
