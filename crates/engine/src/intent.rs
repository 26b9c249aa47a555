//! Unlock intents: the unit of work between the stream processor and
//! the unlock synchronizer.

use uuid::Uuid;
use wander_core::types::{DistrictId, RegionId, Timestamp, UserId};

/// A request to unlock one district for one user.
///
/// Created by the stream processor on a containment transition. The
/// `token` is the intent's identity: outcome application is guarded by
/// it, so a network response for a superseded intent can never clobber
/// newer session state. At most one intent per session is in flight;
/// a newer intent for a different district supersedes the old one.
#[derive(Debug, Clone)]
pub struct UnlockIntent {
    /// Identity/version token, unique per intent.
    pub token: Uuid,
    pub district_id: DistrictId,
    pub region_id: RegionId,
    pub user_id: UserId,
    /// The color the requester currently holds or will receive.
    pub color: String,
    pub created_at: Timestamp,
}

impl UnlockIntent {
    pub fn new(
        district_id: DistrictId,
        region_id: RegionId,
        user_id: UserId,
        color: String,
    ) -> Self {
        Self {
            token: Uuid::new_v4(),
            district_id,
            region_id,
            user_id,
            color,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Lifecycle of an intent. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentState {
    Pending,
    Confirmed,
    Rejected,
    Superseded,
}

impl IntentState {
    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentState::Pending => "pending",
            IntentState::Confirmed => "confirmed",
            IntentState::Rejected => "rejected",
            IntentState::Superseded => "superseded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_have_unique_tokens() {
        let a = UnlockIntent::new("d1".into(), "r1".into(), "u1".into(), "#fff".into());
        let b = UnlockIntent::new("d1".into(), "r1".into(), "u1".into(), "#fff".into());
        assert_ne!(a.token, b.token);
    }
}
