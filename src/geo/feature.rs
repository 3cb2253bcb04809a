//! Feature model for LCZ/ICU vector datasets.
//!
//! Datasets arrive as GeoJSON. Only what the statistics need is kept:
//! polygon rings as `Coord<f64>` (x = longitude, y = latitude) and a flat map
//! of scalar properties. Everything else (points, lines, nested property
//! values) is either reduced to `Geometry::Other` or dropped.
//!
//! Well-formed documents go through the `geojson` parser. A document that is
//! valid JSON but breaks GeoJSON rules in some features (non-object
//! properties, missing geometry, short positions) is read leniently instead:
//! the broken parts of those features become absent and the rest is kept.

use geo_types::Coord;
use geojson::{GeoJson, Geometry as GeoJsonGeometry, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A linear ring of `[longitude, latitude]` positions in degrees.
pub type Ring = Vec<Coord<f64>>;

/// Geometry of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Exterior ring followed by any holes.
    Polygon(Vec<Ring>),
    /// Several polygons, each an exterior ring followed by holes.
    MultiPolygon(Vec<Vec<Ring>>),
    /// Any non-areal geometry (points, lines). Contributes no area.
    Other,
}

/// A scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
    Null,
}

impl PropertyValue {
    /// Converts a JSON value, returning `None` for booleans, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric view of the value. Text holding a number is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// A geometry plus its scalar properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    /// `None` when the source feature had no properties object.
    pub properties: Option<HashMap<String, PropertyValue>>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            properties: Some(HashMap::new()),
        }
    }

    /// Adds or replaces a property.
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value);
        self
    }

    /// Looks up an optional attribute.
    ///
    /// Returns `None` when the feature has no properties, lacks the key, or
    /// holds null under it. Callers treat all three the same way.
    pub fn attribute(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .as_ref()?
            .get(name)
            .filter(|value| !value.is_null())
    }
}

/// Why GeoJSON text could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("not a GeoJSON document: {0}")]
    NotGeoJson(String),
}

/// Ordered sequence of features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// Result of isolating the features of one municipality.
#[derive(Debug, Clone)]
pub struct Isolation {
    pub collection: FeatureCollection,
    /// False when the data carries no such attribute and was returned whole.
    pub applied: bool,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parses GeoJSON text.
    ///
    /// A FeatureCollection, a single Feature or a bare Geometry are all
    /// accepted; the latter two become a collection of one. Only invalid JSON
    /// or a document that is not GeoJSON at all is an error.
    pub fn from_geojson_str(text: &str) -> Result<Self, ParseError> {
        let features = match text.parse::<GeoJson>() {
            Ok(GeoJson::FeatureCollection(fc)) => fc.features.iter().map(convert_feature).collect(),
            Ok(GeoJson::Feature(f)) => vec![convert_feature(&f)],
            Ok(GeoJson::Geometry(g)) => vec![Feature {
                geometry: Some(convert_geometry(&g)),
                properties: None,
            }],
            Err(strict) => {
                let value: serde_json::Value = serde_json::from_str(text)?;
                log::warn!("GeoJSON is not strictly valid ({}), reading leniently", strict);
                lenient::document(&value)?
            }
        };

        Ok(Self { features })
    }

    /// Whether the data carries `name` as an attribute.
    ///
    /// Only the first feature is inspected: datasets are either fully
    /// intersected with municipalities or not at all.
    pub fn has_property(&self, name: &str) -> bool {
        self.features
            .first()
            .and_then(|f| f.properties.as_ref())
            .is_some_and(|p| p.contains_key(name))
    }

    /// Keeps only features whose text attribute `name` equals `value`.
    pub fn isolate(&self, name: &str, value: &str) -> Isolation {
        if !self.has_property(name) {
            log::warn!(
                "Dataset has no '{}' attribute, municipality filtering not applied",
                name
            );
            return Isolation {
                collection: self.clone(),
                applied: false,
            };
        }

        let features: Vec<Feature> = self
            .features
            .iter()
            .filter(|f| f.attribute(name).and_then(PropertyValue::as_str) == Some(value))
            .cloned()
            .collect();

        log::debug!("Isolated {} feature(s) for {}", features.len(), value);

        Isolation {
            collection: Self { features },
            applied: true,
        }
    }

    /// Sorted, de-duplicated text values of an attribute.
    pub fn distinct_text_values(&self, name: &str) -> Vec<String> {
        self.features
            .iter()
            .filter_map(|f| f.attribute(name).and_then(PropertyValue::as_str))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn convert_feature(feature: &geojson::Feature) -> Feature {
    let properties = feature.properties.as_ref().map(|props| {
        props
            .iter()
            .filter_map(|(k, v)| PropertyValue::from_json(v).map(|value| (k.clone(), value)))
            .collect()
    });

    Feature {
        geometry: feature.geometry.as_ref().map(convert_geometry),
        properties,
    }
}

fn convert_geometry(geometry: &GeoJsonGeometry) -> Geometry {
    match &geometry.value {
        Value::Polygon(rings) => Geometry::Polygon(convert_rings(rings)),
        Value::MultiPolygon(polygons) => {
            Geometry::MultiPolygon(polygons.iter().map(|rings| convert_rings(rings)).collect())
        }
        Value::GeometryCollection(geometries) => {
            // First areal member wins
            geometries
                .iter()
                .map(convert_geometry)
                .find(|g| !matches!(g, Geometry::Other))
                .unwrap_or(Geometry::Other)
        }
        _ => Geometry::Other,
    }
}

fn convert_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| ring.iter().filter_map(|p| to_coord(p)).collect())
        .collect()
}

fn to_coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

/// Reading of GeoJSON-shaped JSON that tolerates per-feature defects.
mod lenient {
    use super::{Feature, Geometry, ParseError, PropertyValue, Ring};
    use geo_types::Coord;
    use serde_json::Value;

    const GEOMETRY_TYPES: [&str; 7] = [
        "Point",
        "MultiPoint",
        "LineString",
        "MultiLineString",
        "Polygon",
        "MultiPolygon",
        "GeometryCollection",
    ];

    pub(super) fn document(value: &Value) -> Result<Vec<Feature>, ParseError> {
        match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => value
                .get("features")
                .and_then(Value::as_array)
                .map(|features| features.iter().map(feature).collect())
                .ok_or_else(|| {
                    ParseError::NotGeoJson("FeatureCollection without a features array".into())
                }),
            Some("Feature") => Ok(vec![feature(value)]),
            Some(kind) if GEOMETRY_TYPES.contains(&kind) => Ok(vec![Feature {
                geometry: Some(geometry(value)),
                properties: None,
            }]),
            Some(kind) => Err(ParseError::NotGeoJson(format!("unknown type '{}'", kind))),
            None => Err(ParseError::NotGeoJson("missing 'type'".into())),
        }
    }

    fn feature(value: &Value) -> Feature {
        let properties = value
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(k, v)| PropertyValue::from_json(v).map(|value| (k.clone(), value)))
                    .collect()
            });

        let geometry = match value.get("geometry") {
            None | Some(Value::Null) => None,
            Some(g) => Some(geometry(g)),
        };

        Feature {
            geometry,
            properties,
        }
    }

    fn geometry(value: &Value) -> Geometry {
        match value.get("type").and_then(Value::as_str) {
            Some("Polygon") => Geometry::Polygon(rings(value.get("coordinates"))),
            Some("MultiPolygon") => Geometry::MultiPolygon(
                value
                    .get("coordinates")
                    .and_then(Value::as_array)
                    .map(|polygons| polygons.iter().map(|p| rings(Some(p))).collect())
                    .unwrap_or_default(),
            ),
            Some("GeometryCollection") => value
                .get("geometries")
                .and_then(Value::as_array)
                .and_then(|members| {
                    members
                        .iter()
                        .map(geometry)
                        .find(|g| !matches!(g, Geometry::Other))
                })
                .unwrap_or(Geometry::Other),
            _ => Geometry::Other,
        }
    }

    fn rings(value: Option<&Value>) -> Vec<Ring> {
        value
            .and_then(Value::as_array)
            .map(|rings| {
                rings
                    .iter()
                    .map(|ring| {
                        ring.as_array()
                            .map(|points| points.iter().filter_map(coord).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn coord(position: &Value) -> Option<Coord<f64>> {
        match position.as_array()?.as_slice() {
            [x, y, ..] => Some(Coord {
                x: x.as_f64()?,
                y: y.as_f64()?,
            }),
            _ => None,
        }
    }
}
