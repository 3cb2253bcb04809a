//! Class statistics over feature collections.
//!
//! Two aggregation modes are provided:
//! - discrete: one class per attribute value (LCZ codes)
//! - range: numeric values bucketed into half-open intervals (ICU deltas)
//!
//! Every run builds a fresh result; nothing is shared between calls.

mod aggregate;
mod classify;
mod compare;

pub use aggregate::{
    aggregate_discrete, aggregate_discrete_with, aggregate_ranges, share_percent, total_area,
    weighted_mean, ClassStats, RangeBucket, RangeStats, SkippedFeatures, StatsEntry,
};
pub use classify::{ClassKey, ClassRange, LczCoding, RangeScheme};
pub use compare::{compare, ComparisonRow};
