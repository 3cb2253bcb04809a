//! Classification schemes: discrete class keys and numeric range buckets.

use crate::geo::PropertyValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of classifying one feature.
///
/// Numeric codes sort before text labels, and codes sort as integers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassKey {
    /// Integral attribute value, e.g. an LCZ code.
    Code(i64),
    /// Any other value, or a range label.
    Label(String),
}

impl ClassKey {
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Self::Code(code) => Some(*code),
            Self::Label(_) => None,
        }
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Label(label) => write!(f, "{}", label),
        }
    }
}

/// Numbering used by the data source for LCZ codes.
///
/// WUDAPT numbers the natural classes A..G as 11..17 where the canonical
/// scheme uses 101..107. Declaring `Wudapt` shifts that sub-range by +90.
/// The coding is never guessed from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LczCoding {
    #[default]
    Canonical,
    Wudapt,
}

impl LczCoding {
    /// Maps a raw attribute value to the canonical numbering.
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            Self::Wudapt if (11.0..=17.0).contains(&value) => value + 90.0,
            _ => value,
        }
    }

    /// Classifies a raw attribute value. Returns `None` for null.
    pub fn class_key(self, value: &PropertyValue) -> Option<ClassKey> {
        let number = match value {
            PropertyValue::Null => return None,
            PropertyValue::Number(n) => *n,
            PropertyValue::Text(text) => match value.as_f64() {
                Some(n) => n,
                None => return Some(ClassKey::Label(text.clone())),
            },
        };

        let number = self.normalize(number);
        if number.is_finite() && number.fract() == 0.0 && number.abs() <= MAX_EXACT_INTEGER {
            Some(ClassKey::Code(number as i64))
        } else {
            Some(ClassKey::Label(number.to_string()))
        }
    }
}

/// Largest magnitude below which every integer is exactly representable
/// as `f64` (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A named half-open interval `[min, max)` with a display colour.
///
/// Open ends are encoded as infinities in memory and as `null` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRange {
    pub label: String,
    #[serde(with = "lower_bound")]
    pub min: f64,
    #[serde(with = "upper_bound")]
    pub max: f64,
    /// Hex colour, e.g. `#ffffbf`.
    pub color: String,
}

impl ClassRange {
    pub fn new(label: impl Into<String>, min: f64, max: f64, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            min,
            max,
            color: color.into(),
        }
    }

    /// Left-inclusive, right-exclusive membership.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }
}

/// Ordered list of class ranges.
///
/// The ranges are expected to partition the value domain; this is not
/// validated. Lookup is first-match in declared order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeScheme {
    ranges: Vec<ClassRange>,
}

impl RangeScheme {
    pub fn new(ranges: Vec<ClassRange>) -> Self {
        Self { ranges }
    }

    /// The seven urban heat island intensity classes (°C delta).
    pub fn icu_default() -> Self {
        Self::new(vec![
            ClassRange::new("Very cold", f64::NEG_INFINITY, -2.0, "#313695"),
            ClassRange::new("Cold", -2.0, -1.0, "#4575b4"),
            ClassRange::new("Cool", -1.0, 0.0, "#abd9e9"),
            ClassRange::new("Neutral", 0.0, 1.0, "#ffffbf"),
            ClassRange::new("Warm", 1.0, 2.0, "#fdae61"),
            ClassRange::new("Very warm", 2.0, 3.0, "#f46d43"),
            ClassRange::new("Extreme", 3.0, f64::INFINITY, "#a50026"),
        ])
    }

    /// Index of the first range containing `value`.
    pub fn classify(&self, value: f64) -> Option<usize> {
        self.ranges.iter().position(|range| range.contains(value))
    }

    pub fn ranges(&self) -> &[ClassRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Serde helpers mapping `null` to an open lower bound.
mod lower_bound {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
    }
}

/// Serde helpers mapping `null` to an open upper bound.
mod upper_bound {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::lower_bound::serialize(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
