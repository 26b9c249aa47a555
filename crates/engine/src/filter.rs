//! Proximity pre-filter.
//!
//! Ranks districts by planar distance from the fix to their cached
//! centroid so that exact containment runs against a bounded candidate
//! list instead of the whole district set. This is an optimization, not
//! a correctness layer: a point inside a very large or odd-shaped
//! district whose centroid lies beyond the cutoff is an accepted false
//! negative (see DESIGN.md).

use std::cmp::Ordering;

use wander_core::district::District;
use wander_core::geometry::{planar_distance, LatLon};
use wander_core::types::DistrictId;

use crate::config::EngineConfig;

/// One district considered for exact containment, with its centroid
/// distance in coordinate degrees.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub district_id: DistrictId,
    pub distance_deg: f64,
}

/// Rank districts by centroid distance, ascending.
///
/// Districts without usable geometry are never candidates. Districts
/// beyond [`EngineConfig::cutoff_deg`] are excluded, and the list is
/// truncated to [`EngineConfig::top_k`].
pub fn rank_candidates(
    point: &LatLon,
    districts: &[District],
    config: &EngineConfig,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = districts
        .iter()
        .filter(|d| d.has_usable_geometry())
        .filter_map(|d| {
            let centroid = d.centroid?;
            let distance_deg = planar_distance(point, &centroid);
            (distance_deg <= config.cutoff_deg).then(|| Candidate {
                district_id: d.id.clone(),
                distance_deg,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance_deg
            .partial_cmp(&b.distance_deg)
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(config.top_k);
    candidates
}

/// Find the district containing the point, if any, among candidates
/// within the cutoff.
///
/// The nearest candidate inside [`EngineConfig::near_certain_deg`] is
/// accepted without an exact test; otherwise candidates are
/// exact-tested in distance order.
pub fn find_containing<'a>(
    point: &LatLon,
    districts: &'a [District],
    config: &EngineConfig,
) -> Option<&'a District> {
    let candidates = rank_candidates(point, districts, config);

    let lookup = |id: &str| districts.iter().find(|d| d.id == id);

    if let Some(nearest) = candidates.first() {
        if nearest.distance_deg < config.near_certain_deg {
            return lookup(&nearest.district_id);
        }
    }

    candidates
        .iter()
        .find_map(|c| lookup(&c.district_id).filter(|d| d.contains(point)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A small square district centered on (lat, lon).
    fn square_at(id: &str, lat: f64, lon: f64, half: f64) -> District {
        District::new(
            id.to_string(),
            id.to_string(),
            vec![
                LatLon::new(lat - half, lon - half),
                LatLon::new(lat - half, lon + half),
                LatLon::new(lat + half, lon + half),
                LatLon::new(lat + half, lon - half),
            ],
            Some("r1".to_string()),
        )
    }

    #[test]
    fn candidates_are_sorted_ascending() {
        let districts = vec![
            square_at("far", 0.03, 0.0, 0.001),
            square_at("near", 0.001, 0.0, 0.001),
            square_at("mid", 0.01, 0.0, 0.001),
        ];
        let config = EngineConfig::default();
        let ranked = rank_candidates(&LatLon::new(0.0, 0.0), &districts, &config);
        let ids: Vec<&str> = ranked.iter().map(|c| c.district_id.as_str()).collect();
        assert_eq!(ids, ["near", "mid", "far"]);
    }

    #[test]
    fn cutoff_excludes_distant_districts() {
        let districts = vec![square_at("away", 1.0, 1.0, 0.001)];
        let config = EngineConfig::default();
        let ranked = rank_candidates(&LatLon::new(0.0, 0.0), &districts, &config);
        assert!(ranked.is_empty());
    }

    #[test]
    fn top_k_bounds_the_candidate_list() {
        let districts: Vec<District> = (0..20)
            .map(|i| square_at(&format!("d{i}"), 0.001 * i as f64, 0.0, 0.0004))
            .collect();
        let config = EngineConfig {
            top_k: 3,
            ..Default::default()
        };
        let ranked = rank_candidates(&LatLon::new(0.0, 0.0), &districts, &config);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].district_id, "d0");
    }

    #[test]
    fn unusable_geometry_is_never_a_candidate() {
        let broken = District::new("broken".into(), "Broken".into(), Vec::new(), None);
        let config = EngineConfig::default();
        let ranked = rank_candidates(&LatLon::new(0.0, 0.0), &[broken], &config);
        assert!(ranked.is_empty());
    }

    #[test]
    fn find_containing_prefers_exact_hit() {
        let districts = vec![
            square_at("left", 0.0, -0.01, 0.004),
            square_at("right", 0.0, 0.01, 0.004),
        ];
        let config = EngineConfig {
            near_certain_deg: 0.0, // force exact tests
            ..Default::default()
        };
        let hit = find_containing(&LatLon::new(0.0, 0.011), &districts, &config).unwrap();
        assert_eq!(hit.id, "right");
    }

    #[test]
    fn near_certain_short_circuits_exact_test() {
        // Point is just outside the polygon but within the near-certain
        // radius of its centroid: accepted without an exact test.
        let districts = vec![square_at("d", 0.0, 0.0, 0.0001)];
        let config = EngineConfig::default();
        let hit = find_containing(&LatLon::new(0.0002, 0.0), &districts, &config);
        assert!(hit.is_some());
    }

    #[test]
    fn far_centroid_false_negative_is_accepted() {
        // A huge district whose centroid is past the cutoff: the point
        // is inside the polygon but the filter never tests it. Accepted
        // approximation, pinned here so a change is deliberate.
        let districts = vec![square_at("huge", 1.0, 1.0, 1.5)];
        let config = EngineConfig::default();
        assert!(find_containing(&LatLon::new(0.0, 0.0), &districts, &config).is_none());
    }

    #[test]
    fn no_districts_no_hit() {
        let config = EngineConfig::default();
        assert!(find_containing(&LatLon::new(0.0, 0.0), &[], &config).is_none());
    }
}
