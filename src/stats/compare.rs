//! Side-by-side comparison of two discrete aggregations (e.g. two years).

use super::aggregate::ClassStats;
use super::classify::ClassKey;
use std::collections::BTreeSet;

/// One class in a two-year comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub key: ClassKey,
    /// Area in hectares on the left side (0 when absent).
    pub left_area: f64,
    /// Area in hectares on the right side (0 when absent).
    pub right_area: f64,
}

impl ComparisonRow {
    /// Change from left to right in hectares.
    pub fn delta(&self) -> f64 {
        self.right_area - self.left_area
    }
}

/// Joins two aggregations on the union of their keys, in ascending order.
pub fn compare(left: &ClassStats, right: &ClassStats) -> Vec<ComparisonRow> {
    let keys: BTreeSet<&ClassKey> = left.iter().chain(right.iter()).map(|(k, _)| k).collect();

    keys.into_iter()
        .map(|key| ComparisonRow {
            key: key.clone(),
            left_area: left.get(key).map_or(0.0, |e| e.area),
            right_area: right.get(key).map_or(0.0, |e| e.area),
        })
        .collect()
}
