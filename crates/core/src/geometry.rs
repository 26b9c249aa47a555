//! Planar geometry primitives for district containment.
//!
//! Latitude/longitude are treated as plain Cartesian coordinates, which
//! is accurate enough at city scale. Distances are in coordinate
//! degrees, not meters; threshold defaults elsewhere are calibrated to
//! that unit.

use serde::{Deserialize, Serialize};

/// A geographic point in the internal lat/lon convention.
///
/// Note this is the opposite axis order from GeoJSON, which encodes
/// positions as `[longitude, latitude]`. Conversion happens once, in
/// [`crate::geojson::normalize_coordinates`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Even-odd ray-casting containment test over a simple polygon.
///
/// The polygon is implicitly closed: the last vertex connects back to
/// the first. Points exactly on an edge or vertex may resolve either
/// way; GPS fixes are never exact-edge in practice, so this is an
/// accepted approximation rather than a defect.
///
/// Returns `false` for degenerate polygons (fewer than 3 vertices).
pub fn point_in_polygon(point: &LatLon, polygon: &[LatLon]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let (px, py) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (polygon[i].longitude, polygon[i].latitude);
        let (xj, yj) = (polygon[j].longitude, polygon[j].latitude);

        let crosses = (yi > py) != (yj > py);
        if crosses && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Vertex-mean centroid of a polygon.
///
/// This is the arithmetic mean of the vertices, not the area centroid.
/// It is only used to rank candidate districts by rough proximity, where
/// the cheaper mean is sufficient. Returns `None` for an empty vertex
/// list.
pub fn centroid(polygon: &[LatLon]) -> Option<LatLon> {
    if polygon.is_empty() {
        return None;
    }
    let n = polygon.len() as f64;
    let (lat_sum, lon_sum) = polygon.iter().fold((0.0, 0.0), |(lat, lon), p| {
        (lat + p.latitude, lon + p.longitude)
    });
    Some(LatLon::new(lat_sum / n, lon_sum / n))
}

/// Euclidean distance between two points, in coordinate degrees.
///
/// The degree unit means the physical distance represented by one unit
/// grows smaller with latitude along the east-west axis. Acceptable for
/// ranking candidates at city scale; deliberately not haversine (see
/// DESIGN.md).
pub fn planar_distance(a: &LatLon, b: &LatLon) -> f64 {
    let dlat = a.latitude - b.latitude;
    let dlon = a.longitude - b.longitude;
    (dlat * dlat + dlon * dlon).sqrt()
}
