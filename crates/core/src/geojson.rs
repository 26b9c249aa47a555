//! GeoJSON coordinate normalization.
//!
//! The backend stores district boundaries as GeoJSON geometry, where
//! `coordinates` nesting depth varies between `Polygon` and
//! `MultiPolygon` encodings (holes are not used by the product and are
//! flattened along with everything else). This module reduces any of
//! those shapes to a flat, ordered vertex list in the internal lat/lon
//! convention.

use serde_json::Value;

use crate::geometry::LatLon;

/// Flatten a GeoJSON `coordinates` value into an ordered vertex list.
///
/// Recursively walks arbitrarily nested arrays; every leaf array whose
/// first two elements are numbers is taken as a `[longitude, latitude]`
/// position and swapped into lat/lon. Source order is preserved. If the
/// resulting ring closes with a duplicate of its first vertex, the
/// duplicate is dropped (rings are implicitly closed internally).
///
/// Malformed or degenerate input (non-array, no numeric leaves, fewer
/// than 3 distinct vertices) yields an empty vector. The caller must
/// treat such a district as geometrically unusable, excluded from
/// containment tests and rendering, rather than failing the whole
/// district set.
pub fn normalize_coordinates(coordinates: &Value) -> Vec<LatLon> {
    let mut points = Vec::new();
    flatten_into(coordinates, &mut points);

    if points.len() > 1 && points.last() == points.first() {
        points.pop();
    }
    if points.len() < 3 {
        return Vec::new();
    }
    points
}

/// Extract and normalize the `coordinates` member of a GeoJSON geometry
/// object. Missing member or non-object input yields an empty vector,
/// same degrade policy as [`normalize_coordinates`].
pub fn normalize_geometry(geometry: &Value) -> Vec<LatLon> {
    match geometry.get("coordinates") {
        Some(coordinates) => normalize_coordinates(coordinates),
        None => Vec::new(),
    }
}

fn flatten_into(value: &Value, out: &mut Vec<LatLon>) {
    let Some(items) = value.as_array() else {
        return;
    };

    // A leaf position is an array starting with two numbers (extra
    // members such as altitude are ignored).
    if items.len() >= 2 {
        if let (Some(lon), Some(lat)) = (items[0].as_f64(), items[1].as_f64()) {
            out.push(LatLon::new(lat, lon));
            return;
        }
    }

    for item in items {
        flatten_into(item, out);
    }
}
