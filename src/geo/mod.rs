//! Geographic feature model and area estimation.
//!
//! Features are loaded from GeoJSON and kept immutable afterwards; the
//! statistics and the viewer only ever read them.

mod area;
mod feature;

#[cfg(test)]
pub(crate) use area::square_ring;
pub use area::{
    geometry_area, geometry_area_hectares, polygon_area, ring_area, EARTH_RADIUS_M,
    SQUARE_METERS_PER_HECTARE,
};
pub use feature::{
    Feature, FeatureCollection, Geometry, Isolation, ParseError, PropertyValue, Ring,
};
