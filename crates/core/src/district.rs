//! The district model: the client's view of one polygonal map region.

use serde::Serialize;

use crate::geometry::{self, LatLon};
use crate::palette::LOCKED_GRAY;
use crate::types::{DistrictId, RegionId, UserId};

/// A named polygonal region that is either locked or unlocked.
///
/// Lock state and color are mutated only through the registry: either
/// optimistically by the stream processor (pending backend confirmation)
/// or authoritatively by the unlock synchronizer.
#[derive(Debug, Clone, Serialize)]
pub struct District {
    pub id: DistrictId,
    /// Display label, also the key of the per-session celebration set.
    pub name: String,
    /// Ordered vertices, ring implicitly closed (first != last). Empty
    /// when the backend geometry was malformed; such a district is
    /// excluded from containment tests and rendering.
    pub polygon: Vec<LatLon>,
    /// Vertex-mean centroid cached at load time so the proximity filter
    /// does not recompute it per fix. `None` iff the polygon is unusable.
    pub centroid: Option<LatLon>,
    /// Owning administrative region; required to issue an unlock.
    /// `None` only transiently during load.
    pub region_id: Option<RegionId>,
    pub is_unlocked: bool,
    /// Set on confirmed unlock. An optimistic unlock may leave this
    /// populated before confirmation; rejection rolls it back.
    pub unlocked_by_user_id: Option<UserId>,
    /// Fill color for rendering; [`LOCKED_GRAY`] until someone unlocks
    /// the district or the color resolver assigns one.
    pub color: String,
}

impl District {
    /// Build a district from already-normalized geometry, caching the
    /// centroid.
    pub fn new(
        id: DistrictId,
        name: String,
        polygon: Vec<LatLon>,
        region_id: Option<RegionId>,
    ) -> Self {
        let centroid = geometry::centroid(&polygon);
        Self {
            id,
            name,
            polygon,
            centroid,
            region_id,
            is_unlocked: false,
            unlocked_by_user_id: None,
            color: LOCKED_GRAY.to_string(),
        }
    }

    /// Whether the geometry survived normalization and can be used for
    /// containment tests.
    pub fn has_usable_geometry(&self) -> bool {
        self.polygon.len() >= 3
    }

    /// Whether the given point falls inside this district's polygon.
    pub fn contains(&self, point: &LatLon) -> bool {
        geometry::point_in_polygon(point, &self.polygon)
    }
}
