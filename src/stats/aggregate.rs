//! Area and count aggregation per class.
//!
//! Both aggregation modes are permissive: features without the attribute,
//! without geometry, or with values outside every range are skipped rather
//! than reported as errors. What was skipped is tallied in [`SkippedFeatures`]
//! so callers can surface data-quality problems.

use super::classify::{ClassKey, ClassRange, LczCoding, RangeScheme};
use crate::geo::{geometry_area_hectares, Feature, FeatureCollection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accumulated statistics for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsEntry {
    /// Total area in hectares.
    pub area: f64,
    /// Number of features.
    pub count: u64,
}

impl StatsEntry {
    /// Adds one feature of the given area.
    pub fn add(&mut self, area: f64) {
        self.area += area;
        self.count += 1;
    }
}

/// Features left out of an aggregation, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkippedFeatures {
    /// No properties, no such key, or a null value.
    pub missing_attribute: usize,
    /// Range mode only: value is not numeric.
    pub non_numeric: usize,
    /// Range mode only: numeric value outside every range.
    pub out_of_range: usize,
}

impl SkippedFeatures {
    pub fn total(&self) -> usize {
        self.missing_attribute + self.non_numeric + self.out_of_range
    }
}

/// Per-class statistics from discrete aggregation.
///
/// The mapping itself is unordered; use [`ClassStats::sorted`] for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassStats {
    entries: HashMap<ClassKey, StatsEntry>,
    pub skipped: SkippedFeatures,
}

impl ClassStats {
    pub fn get(&self, key: &ClassKey) -> Option<&StatsEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassKey, &StatsEntry)> {
        self.entries.iter()
    }

    /// Entries in ascending key order.
    pub fn sorted(&self) -> Vec<(&ClassKey, &StatsEntry)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Entries by descending area.
    pub fn by_area(&self) -> Vec<(&ClassKey, &StatsEntry)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| b.1.area.total_cmp(&a.1.area).then_with(|| a.0.cmp(b.0)));
        entries
    }

    pub fn total_area(&self) -> f64 {
        total_area(self.entries.values())
    }

    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }
}

/// One range bucket with its accumulated statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBucket {
    pub range: ClassRange,
    pub stats: StatsEntry,
}

/// Per-range statistics, in the scheme's declared order.
///
/// Every range of the scheme is present, empty ones at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeStats {
    pub buckets: Vec<RangeBucket>,
    pub skipped: SkippedFeatures,
}

impl RangeStats {
    pub fn get(&self, label: &str) -> Option<&StatsEntry> {
        self.buckets
            .iter()
            .find(|b| b.range.label == label)
            .map(|b| &b.stats)
    }

    pub fn total_area(&self) -> f64 {
        total_area(self.buckets.iter().map(|b| &b.stats))
    }

    pub fn total_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.stats.count).sum()
    }
}

/// Groups features by the value of `attribute` using canonical LCZ coding.
pub fn aggregate_discrete(collection: &FeatureCollection, attribute: &str) -> ClassStats {
    aggregate_discrete_with(collection, attribute, LczCoding::Canonical)
}

/// Groups features by the value of `attribute`, normalizing codes first.
pub fn aggregate_discrete_with(
    collection: &FeatureCollection,
    attribute: &str,
    coding: LczCoding,
) -> ClassStats {
    let mut stats = ClassStats::default();

    for feature in &collection.features {
        let Some(key) = feature
            .attribute(attribute)
            .and_then(|value| coding.class_key(value))
        else {
            stats.skipped.missing_attribute += 1;
            continue;
        };

        stats
            .entries
            .entry(key)
            .or_default()
            .add(feature_hectares(feature));
    }

    log_skipped(attribute, &stats.skipped);
    stats
}

/// Buckets features by the numeric value of `attribute`.
///
/// Each feature goes to the first range containing its value. Values that
/// fall in no range are dropped so they cannot skew the distribution.
pub fn aggregate_ranges(
    collection: &FeatureCollection,
    attribute: &str,
    scheme: &RangeScheme,
) -> RangeStats {
    let mut stats = RangeStats {
        buckets: scheme
            .ranges()
            .iter()
            .map(|range| RangeBucket {
                range: range.clone(),
                stats: StatsEntry::default(),
            })
            .collect(),
        skipped: SkippedFeatures::default(),
    };

    for feature in &collection.features {
        let Some(value) = feature.attribute(attribute) else {
            stats.skipped.missing_attribute += 1;
            continue;
        };
        let Some(number) = value.as_f64() else {
            stats.skipped.non_numeric += 1;
            continue;
        };
        let Some(index) = scheme.classify(number) else {
            stats.skipped.out_of_range += 1;
            continue;
        };

        stats.buckets[index].stats.add(feature_hectares(feature));
    }

    log_skipped(attribute, &stats.skipped);
    stats
}

/// Sum of the area of all entries, in hectares. Zero when empty.
pub fn total_area<'a>(entries: impl IntoIterator<Item = &'a StatsEntry>) -> f64 {
    entries.into_iter().map(|e| e.area).sum()
}

/// Share of `area` in `total` as a percentage; 0 when `total` is 0.
pub fn share_percent(area: f64, total: f64) -> f64 {
    if total > 0.0 {
        area / total * 100.0
    } else {
        0.0
    }
}

/// Area-weighted mean of a numeric attribute (e.g. mean ICU delta).
///
/// Returns 0 when no feature with a numeric value has any area.
pub fn weighted_mean(collection: &FeatureCollection, attribute: &str) -> f64 {
    let (weighted, area) = collection
        .features
        .iter()
        .filter_map(|f| {
            let value = f.attribute(attribute)?.as_f64()?;
            Some((value, feature_hectares(f)))
        })
        .fold((0.0, 0.0), |(sum, total), (value, area)| {
            (sum + value * area, total + area)
        });

    if area > 0.0 {
        weighted / area
    } else {
        0.0
    }
}

fn feature_hectares(feature: &Feature) -> f64 {
    feature.geometry.as_ref().map_or(0.0, geometry_area_hectares)
}

fn log_skipped(attribute: &str, skipped: &SkippedFeatures) {
    if skipped.total() > 0 {
        log::debug!(
            "Aggregation on '{}' skipped {} feature(s): {:?}",
            attribute,
            skipped.total(),
            skipped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{square_ring, Geometry, PropertyValue};

    fn square_feature(attribute: &str, value: PropertyValue) -> Feature {
        Feature::new(Geometry::Polygon(vec![square_ring(7.4, 48.9, 0.01)]))
            .with_property(attribute, value)
    }

    fn single_square_hectares() -> f64 {
        geometry_area_hectares(&Geometry::Polygon(vec![square_ring(7.4, 48.9, 0.01)]))
    }

    #[test]
    fn test_empty_collection() {
        let stats = aggregate_discrete(&FeatureCollection::default(), "zone");
        assert!(stats.is_empty());
        assert_eq!(stats.total_area(), 0.0);
        assert_eq!(total_area(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_two_squares_same_zone() {
        let fc = FeatureCollection::new(vec![
            square_feature("zone", PropertyValue::Number(1.0)),
            square_feature("zone", PropertyValue::Number(1.0)),
        ]);

        let stats = aggregate_discrete(&fc, "zone");
        assert_eq!(stats.len(), 1);

        let entry = stats.get(&ClassKey::Code(1)).unwrap();
        assert_eq!(entry.count, 2);
        let expected = 2.0 * single_square_hectares();
        assert!((entry.area - expected).abs() < 1e-9);
    }

    #[test]
    fn test_counts_match_features_with_values() {
        let fc = FeatureCollection::new(vec![
            square_feature("LCZ", PropertyValue::Number(2.0)),
            square_feature("LCZ", PropertyValue::Number(6.0)),
            square_feature("LCZ", PropertyValue::Number(2.0)),
            square_feature("LCZ", PropertyValue::Null),
            square_feature("other", PropertyValue::Number(2.0)),
            Feature {
                geometry: None,
                properties: None,
            },
        ]);

        let stats = aggregate_discrete(&fc, "LCZ");
        assert_eq!(stats.total_count(), 3);
        assert_eq!(stats.get(&ClassKey::Code(2)).unwrap().count, 2);
        assert_eq!(stats.get(&ClassKey::Code(6)).unwrap().count, 1);
        assert_eq!(stats.skipped.missing_attribute, 3);
    }

    #[test]
    fn test_feature_without_geometry_counts_with_zero_area() {
        let fc = FeatureCollection::new(vec![Feature {
            geometry: None,
            properties: None,
        }
        .with_property("LCZ", PropertyValue::Number(4.0))]);

        let stats = aggregate_discrete(&fc, "LCZ");
        let entry = stats.get(&ClassKey::Code(4)).unwrap();
        assert_eq!(entry.count, 1);
        assert_eq!(entry.area, 0.0);
    }

    #[test]
    fn test_wudapt_remap_only_when_declared() {
        let fc = FeatureCollection::new(vec![
            square_feature("LCZ", PropertyValue::Number(11.0)),
            square_feature("LCZ", PropertyValue::Number(17.0)),
            square_feature("LCZ", PropertyValue::Number(8.0)),
        ]);

        let wudapt = aggregate_discrete_with(&fc, "LCZ", LczCoding::Wudapt);
        let keys: Vec<_> = wudapt.sorted().into_iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![ClassKey::Code(8), ClassKey::Code(101), ClassKey::Code(107)]
        );

        let canonical = aggregate_discrete(&fc, "LCZ");
        assert!(canonical.get(&ClassKey::Code(11)).is_some());
        assert!(canonical.get(&ClassKey::Code(101)).is_none());
    }

    #[test]
    fn test_range_value_between_buckets() {
        let scheme = RangeScheme::new(vec![
            ClassRange::new("low", 0.0, 1.0, "#0000ff"),
            ClassRange::new("high", 1.0, 2.0, "#ff0000"),
        ]);
        let fc = FeatureCollection::new(vec![square_feature("ICU", PropertyValue::Number(1.5))]);

        let stats = aggregate_ranges(&fc, "ICU", &scheme);
        assert_eq!(stats.get("high").unwrap().count, 1);
        assert_eq!(stats.get("low").unwrap().count, 0);
        assert_eq!(stats.buckets.len(), 2);
    }

    #[test]
    fn test_range_boundary_goes_to_upper_bucket() {
        let scheme = RangeScheme::new(vec![
            ClassRange::new("low", 0.0, 1.0, "#0000ff"),
            ClassRange::new("high", 1.0, 2.0, "#ff0000"),
        ]);
        let fc = FeatureCollection::new(vec![square_feature("ICU", PropertyValue::Number(1.0))]);

        let stats = aggregate_ranges(&fc, "ICU", &scheme);
        assert_eq!(stats.get("high").unwrap().count, 1);
        assert_eq!(stats.get("low").unwrap().count, 0);
    }

    #[test]
    fn test_range_drops_unmatched_and_non_numeric() {
        let scheme = RangeScheme::new(vec![ClassRange::new("only", 0.0, 1.0, "#000000")]);
        let fc = FeatureCollection::new(vec![
            square_feature("ICU", PropertyValue::Number(0.5)),
            square_feature("ICU", PropertyValue::Number(7.0)),
            square_feature("ICU", PropertyValue::Text("n/a".into())),
            square_feature("ICU", PropertyValue::Null),
        ]);

        let stats = aggregate_ranges(&fc, "ICU", &scheme);
        assert_eq!(stats.total_count(), 1);
        assert_eq!(stats.skipped.out_of_range, 1);
        assert_eq!(stats.skipped.non_numeric, 1);
        assert_eq!(stats.skipped.missing_attribute, 1);
        assert!((stats.total_area() - single_square_hectares()).abs() < 1e-9);
    }

    #[test]
    fn test_icu_default_buckets() {
        let fc = FeatureCollection::new(vec![
            square_feature("ICU_theori", PropertyValue::Number(-3.0)),
            square_feature("ICU_theori", PropertyValue::Number(0.2)),
            square_feature("ICU_theori", PropertyValue::Number(4.5)),
        ]);

        let stats = aggregate_ranges(&fc, "ICU_theori", &RangeScheme::icu_default());
        assert_eq!(stats.get("Very cold").unwrap().count, 1);
        assert_eq!(stats.get("Neutral").unwrap().count, 1);
        assert_eq!(stats.get("Extreme").unwrap().count, 1);
        assert_eq!(stats.get("Warm").unwrap().count, 0);
    }

    #[test]
    fn test_share_percent_guards_zero_total() {
        assert_eq!(share_percent(10.0, 0.0), 0.0);
        assert!((share_percent(25.0, 200.0) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mean() {
        let fc = FeatureCollection::new(vec![
            square_feature("ICU", PropertyValue::Number(1.0)),
            square_feature("ICU", PropertyValue::Number(3.0)),
            square_feature("ICU", PropertyValue::Null),
        ]);
        assert!((weighted_mean(&fc, "ICU") - 2.0).abs() < 1e-9);
        assert_eq!(weighted_mean(&FeatureCollection::default(), "ICU"), 0.0);
    }

    #[test]
    fn test_by_area_orders_largest_first() {
        let fc = FeatureCollection::new(vec![
            square_feature("LCZ", PropertyValue::Number(1.0)),
            square_feature("LCZ", PropertyValue::Number(2.0)),
            square_feature("LCZ", PropertyValue::Number(2.0)),
        ]);
        let stats = aggregate_discrete(&fc, "LCZ");
        let order: Vec<_> = stats.by_area().into_iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(order, vec![ClassKey::Code(2), ClassKey::Code(1)]);
    }
}
