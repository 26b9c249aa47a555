//! Session events consumed by the rendering/UI layer.
//!
//! These are the only signals the engine pushes outward. UI surfaces
//! subscribe via [`crate::session::MapSession::subscribe`] and translate
//! them into toasts, celebration animations, and redraws.

use serde::Serialize;
use wander_core::types::{DistrictId, Timestamp, UserId};

/// Reason code attached to an unlock failure notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnlockFailureKind {
    /// Another user already holds the district. Informational, not
    /// retryable.
    AlreadyOwnedByOther,
    /// The backend rejected the request for an application-level
    /// reason. Not retryable.
    Rejected,
    /// Network-level failure after the silent retry was exhausted. The
    /// UI may offer a manual retry.
    Transient,
}

impl UnlockFailureKind {
    /// String representation for logging and client payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnlockFailureKind::AlreadyOwnedByOther => "already_owned_by_other",
            UnlockFailureKind::Rejected => "rejected",
            UnlockFailureKind::Transient => "transient",
        }
    }

    /// Whether the UI should offer a manual retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UnlockFailureKind::Transient)
    }
}

/// A session-level event originating from the unlock engine.
#[derive(Debug, Clone, Serialize)]
pub enum EngineEvent {
    /// The district set was (re)loaded from the backend.
    DistrictsLoaded {
        /// Number of districts in the registry after the load.
        count: usize,
        /// Number excluded from containment tests because their
        /// geometry did not survive normalization.
        unusable: usize,
    },

    /// A district was unlocked and confirmed by the backend. Emitted at
    /// most once per district name per session (the celebration).
    DistrictUnlocked {
        district_id: DistrictId,
        name: String,
        user_id: UserId,
        color: String,
        timestamp: Timestamp,
    },

    /// An unlock attempt failed. Carries a reason code plus a human
    /// message for toast/alert display.
    UnlockFailed {
        district_id: DistrictId,
        name: String,
        kind: UnlockFailureKind,
        message: String,
    },

    /// The platform denied location access. The session keeps running
    /// without live fixes; the map stays viewable.
    LocationPermissionDenied,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(UnlockFailureKind::Transient.is_retryable());
        assert!(!UnlockFailureKind::AlreadyOwnedByOther.is_retryable());
        assert!(!UnlockFailureKind::Rejected.is_retryable());
    }
}
