//! Wire payloads for the map backend endpoints.
//!
//! The backend mixes camelCase and snake_case field names, so renames
//! are declared per field rather than with a blanket `rename_all`.
//! Optional nested objects stay `Option` so one sparse row never fails
//! the whole fetch.

use serde::{Deserialize, Serialize};
use wander_core::types::{DistrictId, RegionId, UserId};

/// One district row as returned by the district-list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DistrictPayload {
    pub id: DistrictId,
    pub name: String,
    /// Raw GeoJSON geometry. Normalized by the engine at load time;
    /// malformed geometry degrades to an unusable district, never an
    /// error.
    pub boundaries: Option<serde_json::Value>,
    #[serde(rename = "isUnlocked", default)]
    pub is_unlocked: bool,
    /// The user that unlocked the district, when unlocked.
    pub user: Option<UserRef>,
    /// The administrative region owning the district.
    #[serde(rename = "region_assignee")]
    pub region_assignee: Option<RegionRef>,
    /// Fill color recorded at unlock time.
    pub color: Option<String>,
}

/// Minimal user reference embedded in other payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: UserId,
}

/// Minimal region reference embedded in district payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionRef {
    pub id: RegionId,
}

/// One roster member as returned by the map-users endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterUserPayload {
    pub id: UserId,
    pub profile: Option<ProfilePayload>,
    /// Color already held by this user, if previously assigned.
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilePayload {
    pub username: Option<String>,
}

/// One point of interest. Consumed by rendering, not by the engine, but
/// fetched over the same session lifecycle.
#[derive(Debug, Clone, Deserialize)]
pub struct PoiPayload {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "districtId")]
    pub district_id: Option<DistrictId>,
}

/// Body of the unlock request.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockRequestBody {
    pub color: String,
}

/// Response to an unlock request.
#[derive(Debug, Clone, Deserialize)]
pub struct UnlockResponse {
    pub success: bool,
    pub message: Option<String>,
    /// Id of the user currently holding the unlock, when the backend
    /// reports the district as already unlocked.
    #[serde(rename = "unlockedBy")]
    pub unlocked_by: Option<UserId>,
}
