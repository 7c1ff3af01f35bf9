//! Coordinate distance helpers shared by loading validation and snapping.

use geo::{Coord, Point};

/// Mean Earth radius in metres
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Maximum lng/lat offset (degrees) under which two coordinates count as the
/// same point, e.g. a street geometry endpoint and its intersection.
pub const SHARED_ENDPOINT_TOL: f64 = 1e-6;

/// Whether two coordinates coincide within [`SHARED_ENDPOINT_TOL`].
pub fn coords_close(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() <= SHARED_ENDPOINT_TOL && (a.y - b.y).abs() <= SHARED_ENDPOINT_TOL
}

/// Haversine great-circle distance in metres between two lng/lat points.
pub fn haversine_distance_m(a: Point<f64>, b: Point<f64>) -> f64 {
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lng = (b.x() - a.x()).to_radians();

    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = Point::new(-91.7713, 37.9554);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        let d = haversine_distance_m(a, b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Point::new(-91.7713, 37.9554);
        let b = Point::new(-91.7743, 37.9530);
        let ab = haversine_distance_m(a, b);
        let ba = haversine_distance_m(b, a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 250.0 && ab < 500.0, "got {ab}");
    }
}
