//! Display-ready statistics tables.
//!
//! Built from loaded collections whenever the view changes and cached by the
//! app until the next change, so aggregation does not run every frame.

use lcz_workbench::dataset::{DatasetKey, COMMUNE_ATTRIBUTE};
use lcz_workbench::geo::FeatureCollection;
use lcz_workbench::lcz;
use lcz_workbench::stats::{
    aggregate_discrete, aggregate_ranges, compare, share_percent, weighted_mean, ClassKey,
    RangeScheme,
};
use std::borrow::Cow;

/// One LCZ class row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRow {
    pub label: String,
    pub name: &'static str,
    pub color_hex: &'static str,
    /// Hectares.
    pub area: f64,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LczSummary {
    pub rows: Vec<ClassRow>,
    pub total_area: f64,
    pub skipped: usize,
}

/// One heat island bucket row.
#[derive(Debug, Clone, PartialEq)]
pub struct IcuRow {
    pub label: String,
    pub color_hex: String,
    pub area: f64,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IcuSummary {
    pub rows: Vec<IcuRow>,
    pub total_area: f64,
    /// Area-weighted mean temperature delta (°C).
    pub mean_delta: f64,
    pub skipped: usize,
}

/// One class compared across two datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareRow {
    pub label: String,
    pub color_hex: &'static str,
    pub left_area: f64,
    pub right_area: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompareSummary {
    pub rows: Vec<CompareRow>,
    pub left_total: f64,
    pub right_total: f64,
}

/// Statistics for whichever page is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryTables {
    Lcz(LczSummary),
    Icu(IcuSummary),
    Compare(CompareSummary),
}

/// A computed page plus whether the municipality filter could be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub tables: SummaryTables,
    /// False when a municipality was selected but the data has no
    /// municipality attribute, so the whole dataset was used.
    pub filter_applied: bool,
}

/// Restricts a collection to one municipality when requested.
fn scoped<'a>(
    collection: &'a FeatureCollection,
    commune: Option<&str>,
) -> (Cow<'a, FeatureCollection>, bool) {
    match commune {
        Some(name) => {
            let isolation = collection.isolate(COMMUNE_ATTRIBUTE, name);
            (Cow::Owned(isolation.collection), isolation.applied)
        }
        None => (Cow::Borrowed(collection), true),
    }
}

fn class_display(key: &ClassKey) -> (String, &'static str, &'static str) {
    match key.as_code() {
        Some(code) => (
            lcz::label(code),
            lcz::name(code).unwrap_or(""),
            lcz::color_hex(code).unwrap_or(lcz::UNCLASSIFIED_HEX),
        ),
        None => (key.to_string(), "", lcz::UNCLASSIFIED_HEX),
    }
}

pub fn summarize_lcz(
    collection: &FeatureCollection,
    key: DatasetKey,
    commune: Option<&str>,
) -> Summary {
    let (collection, filter_applied) = scoped(collection, commune);
    let stats = aggregate_discrete(&collection, key.lcz_attribute());
    let total_area = stats.total_area();

    let rows = stats
        .sorted()
        .into_iter()
        .map(|(class, entry)| {
            let (label, name, color_hex) = class_display(class);
            ClassRow {
                label,
                name,
                color_hex,
                area: entry.area,
                count: entry.count,
                percent: share_percent(entry.area, total_area),
            }
        })
        .collect();

    Summary {
        tables: SummaryTables::Lcz(LczSummary {
            rows,
            total_area,
            skipped: stats.skipped.total(),
        }),
        filter_applied,
    }
}

pub fn summarize_icu(
    collection: &FeatureCollection,
    key: DatasetKey,
    commune: Option<&str>,
    scheme: &RangeScheme,
) -> Summary {
    let (collection, filter_applied) = scoped(collection, commune);
    let stats = aggregate_ranges(&collection, key.icu_attribute(), scheme);
    let total_area = stats.total_area();

    let rows = stats
        .buckets
        .iter()
        .map(|bucket| IcuRow {
            label: bucket.range.label.clone(),
            color_hex: bucket.range.color.clone(),
            area: bucket.stats.area,
            count: bucket.stats.count,
            percent: share_percent(bucket.stats.area, total_area),
        })
        .collect();

    Summary {
        tables: SummaryTables::Icu(IcuSummary {
            rows,
            total_area,
            mean_delta: weighted_mean(&collection, key.icu_attribute()),
            skipped: stats.skipped.total(),
        }),
        filter_applied,
    }
}

pub fn summarize_compare(
    left: (&FeatureCollection, DatasetKey),
    right: (&FeatureCollection, DatasetKey),
    commune: Option<&str>,
) -> Summary {
    let (left_collection, left_applied) = scoped(left.0, commune);
    let (right_collection, right_applied) = scoped(right.0, commune);
    let left_stats = aggregate_discrete(&left_collection, left.1.lcz_attribute());
    let right_stats = aggregate_discrete(&right_collection, right.1.lcz_attribute());

    let rows = compare(&left_stats, &right_stats)
        .into_iter()
        .map(|row| {
            let (label, _, color_hex) = class_display(&row.key);
            CompareRow {
                label,
                color_hex,
                left_area: row.left_area,
                right_area: row.right_area,
                delta: row.delta(),
            }
        })
        .collect();

    Summary {
        tables: SummaryTables::Compare(CompareSummary {
            rows,
            left_total: left_stats.total_area(),
            right_total: right_stats.total_area(),
        }),
        filter_applied: left_applied && right_applied,
    }
}
