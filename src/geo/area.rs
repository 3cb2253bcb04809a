//! Approximate surface area of polygons given in geographic coordinates.
//!
//! The area of a ring is obtained by the spherical trapezoid sum
//! `Σ (λ2 − λ1) · (2 + sin φ1 + sin φ2)` over consecutive vertices, scaled by
//! `R² / 2` on a sphere of radius [`EARTH_RADIUS_M`]. This is accurate enough
//! for park-sized regions but is not an ellipsoidal area and drifts for very
//! large or near-polar shapes.
//!
//! Only the exterior ring of each polygon is measured. Holes are ignored.

use super::feature::{Geometry, Ring};
use geo_types::Coord;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Square meters in one hectare.
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Area of a single ring in square meters.
///
/// The ring is expected to be closed (last point repeats the first). Rings
/// with fewer than three points have no area.
pub fn ring_area(ring: &[Coord<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let sum: f64 = ring
        .windows(2)
        .map(|pair| {
            let (p1, p2) = (pair[0], pair[1]);
            let (lat1, lat2) = (p1.y.to_radians(), p2.y.to_radians());
            (p2.x.to_radians() - p1.x.to_radians()) * (2.0 + lat1.sin() + lat2.sin())
        })
        .sum();

    (sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

/// Area of a polygon (exterior ring only) in square meters.
pub fn polygon_area(rings: &[Ring]) -> f64 {
    rings.first().map_or(0.0, |exterior| ring_area(exterior))
}

/// Area of any geometry in square meters.
pub fn geometry_area(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Polygon(rings) => polygon_area(rings),
        Geometry::MultiPolygon(polygons) => polygons.iter().map(|p| polygon_area(p)).sum(),
        Geometry::Other => 0.0,
    }
}

/// Area of any geometry in hectares.
pub fn geometry_area_hectares(geometry: &Geometry) -> f64 {
    geometry_area(geometry) / SQUARE_METERS_PER_HECTARE
}

/// Closed axis-aligned square ring with its south-west corner at `(lon, lat)`.
#[cfg(test)]
pub(crate) fn square_ring(lon: f64, lat: f64, span: f64) -> Ring {
    vec![
        Coord { x: lon, y: lat },
        Coord { x: lon + span, y: lat },
        Coord {
            x: lon + span,
            y: lat + span,
        },
        Coord { x: lon, y: lat + span },
        Coord { x: lon, y: lat },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planar_square_area(lat: f64, span: f64) -> f64 {
        let side = span.to_radians();
        side * side * lat.to_radians().cos() * EARTH_RADIUS_M * EARTH_RADIUS_M
    }

    #[test]
    fn test_degenerate_rings_have_no_area() {
        assert_eq!(ring_area(&[]), 0.0);
        assert_eq!(ring_area(&[Coord { x: 7.0, y: 48.0 }]), 0.0);
        assert_eq!(
            ring_area(&[Coord { x: 7.0, y: 48.0 }, Coord { x: 7.1, y: 48.1 }]),
            0.0
        );
        assert_eq!(polygon_area(&[]), 0.0);
    }

    #[test]
    fn test_reversed_ring_has_same_area() {
        let ring = square_ring(7.4, 48.9, 0.01);
        let mut reversed = ring.clone();
        reversed.reverse();

        let a = ring_area(&ring);
        let b = ring_area(&reversed);
        assert!(a > 0.0);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_small_square_matches_planar_approximation() {
        for lat in [0.0, 30.0, 48.9, 60.0] {
            let area = ring_area(&square_ring(7.4, lat, 0.01));
            let expected = planar_square_area(lat, 0.01);
            let error = (area - expected).abs() / expected;
            assert!(error < 0.02, "lat {}: {} vs {}", lat, area, expected);
        }
    }

    #[test]
    fn test_holes_are_not_subtracted() {
        let exterior = square_ring(7.4, 48.9, 0.01);
        let hole = square_ring(7.402, 48.902, 0.002);
        let with_hole = Geometry::Polygon(vec![exterior.clone(), hole]);
        let without = Geometry::Polygon(vec![exterior]);

        assert_eq!(geometry_area(&with_hole), geometry_area(&without));
    }

    #[test]
    fn test_multipolygon_sums_parts() {
        let a = vec![square_ring(7.4, 48.9, 0.01)];
        let b = vec![square_ring(7.5, 48.9, 0.01)];
        let single = geometry_area(&Geometry::Polygon(a.clone()));
        let multi = geometry_area(&Geometry::MultiPolygon(vec![a, b]));

        assert!((multi - 2.0 * single).abs() / multi < 1e-3);
    }

    #[test]
    fn test_non_areal_and_empty_geometry() {
        assert_eq!(geometry_area(&Geometry::Other), 0.0);
        assert_eq!(geometry_area(&Geometry::MultiPolygon(Vec::new())), 0.0);
        assert_eq!(geometry_area(&Geometry::Polygon(vec![Vec::new()])), 0.0);
    }

    #[test]
    fn test_hectare_conversion() {
        let geometry = Geometry::Polygon(vec![square_ring(7.4, 48.9, 0.01)]);
        let m2 = geometry_area(&geometry);
        assert!((geometry_area_hectares(&geometry) - m2 / 10_000.0).abs() < 1e-9);
        // 0.01° square at 48.9°N is roughly 81 ha
        assert!((75.0..90.0).contains(&geometry_area_hectares(&geometry)));
    }
}
