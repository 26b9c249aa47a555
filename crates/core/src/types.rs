/// Districts, regions, and users are identified by opaque backend ids.
pub type DistrictId = String;

/// Identifier of the administrative region owning a district.
pub type RegionId = String;

/// Identifier of a user on a collaborative map.
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
