//! The backend trait the engine is written against.

use async_trait::async_trait;

use crate::api::ApiError;
use crate::payloads::{DistrictPayload, PoiPayload, RosterUserPayload, UnlockResponse};

/// Remote source of truth for districts, rosters, POIs, and unlocks.
///
/// [`crate::api::MapApi`] is the production implementation; tests drive
/// the engine with scripted mocks.
#[async_trait]
pub trait MapBackend: Send + Sync {
    /// Fetch the districts of a map.
    async fn fetch_districts(&self, map_id: &str) -> Result<Vec<DistrictPayload>, ApiError>;

    /// Fetch the users sharing a map.
    async fn fetch_roster(&self, map_id: &str) -> Result<Vec<RosterUserPayload>, ApiError>;

    /// Fetch the points of interest of a map.
    async fn fetch_pois(&self, map_id: &str) -> Result<Vec<PoiPayload>, ApiError>;

    /// Request an unlock of a district for a user.
    ///
    /// The backend answers `success: false` (with a message, and the
    /// current owner when known) rather than an HTTP error for the
    /// already-unlocked case.
    async fn unlock_district(
        &self,
        district_id: &str,
        user_id: &str,
        region_id: &str,
        color: &str,
    ) -> Result<UnlockResponse, ApiError>;
}
