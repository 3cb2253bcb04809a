//! What the user is looking at.

use lcz_workbench::dataset::{DatasetKey, Variant};

/// Which statistics page is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// LCZ class areas for one dataset.
    #[default]
    Lcz,
    /// Heat island buckets for one dataset.
    Icu,
    /// LCZ class areas of two datasets side by side.
    Compare,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Lcz => "LCZ",
            ViewMode::Icu => "ICU",
            ViewMode::Compare => "Compare",
        }
    }

    pub fn all() -> &'static [ViewMode] {
        &[ViewMode::Lcz, ViewMode::Icu, ViewMode::Compare]
    }
}

/// Dataset selection and municipality filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewState {
    pub mode: ViewMode,
    /// Dataset for the single-dataset pages.
    pub primary: DatasetKey,
    /// Left side of the comparison.
    pub left: DatasetKey,
    /// Right side of the comparison.
    pub right: DatasetKey,
    /// Municipality to isolate, if any.
    pub commune: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::default(),
            primary: DatasetKey::new(2025, Variant::Geoclimate),
            left: DatasetKey::new(2015, Variant::Geoclimate),
            right: DatasetKey::new(2025, Variant::Geoclimate),
            commune: None,
        }
    }
}

impl ViewState {
    /// Datasets the current page needs, without duplicates.
    pub fn required_datasets(&self) -> Vec<DatasetKey> {
        match self.mode {
            ViewMode::Lcz | ViewMode::Icu => vec![self.primary],
            ViewMode::Compare if self.left == self.right => vec![self.left],
            ViewMode::Compare => vec![self.left, self.right],
        }
    }

    /// Dataset whose municipalities populate the selector.
    pub fn commune_source(&self) -> DatasetKey {
        match self.mode {
            ViewMode::Compare => self.left,
            _ => self.primary,
        }
    }
}
