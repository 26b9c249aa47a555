//! Roster color assignment.
//!
//! Each user sharing a collaborative map holds one color from a bounded
//! palette, used to fill the districts they unlock. Assignment must be
//! deterministic and stable: the same roster and prior assignments always
//! produce the same result, and a user keeps their color across reloads
//! as long as they remain on the roster.

use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, UserId};

/// Fill color for districts nobody has unlocked yet.
pub const LOCKED_GRAY: &str = "#9e9e9e";

/// Shared neutral color for users beyond the palette size.
///
/// Overflow users visually share one color. Documented degraded
/// behavior, not an error.
pub const FALLBACK_COLOR: &str = "#607d8b";

/// The bounded per-user palette, in assignment priority order.
pub const PALETTE: [&str; 6] = [
    "#e53935", // red
    "#1e88e5", // blue
    "#43a047", // green
    "#fdd835", // yellow
    "#8e24aa", // purple
    "#fb8c00", // orange
];

/// One user's color on a collaborative map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserColorAssignment {
    pub user_id: UserId,
    pub color: String,
    pub assigned_at: Timestamp,
}

/// Assign a color to every user in `roster`.
///
/// Existing assignments whose user is still on the roster are kept
/// verbatim. Users without one receive, in roster order, the
/// lowest-index [`PALETTE`] color not held by any other active user.
/// When the palette is exhausted every excess user receives
/// [`FALLBACK_COLOR`].
///
/// The used-color set is seeded from all surviving assignments before
/// any new color is handed out, so two users can never be given the
/// same palette entry within one call.
pub fn assign_colors(
    roster: &[UserId],
    existing: &[UserColorAssignment],
) -> Vec<UserColorAssignment> {
    let mut result: Vec<UserColorAssignment> = Vec::with_capacity(roster.len());
    let mut used: Vec<&str> = Vec::new();

    // Pass 1: carry over surviving assignments and record their colors.
    for user_id in roster {
        if let Some(assignment) = existing.iter().find(|a| &a.user_id == user_id) {
            used.push(assignment.color.as_str());
            result.push(assignment.clone());
        }
    }

    // Pass 2: hand out palette colors to the remaining users in roster
    // order.
    let now = chrono::Utc::now();
    for user_id in roster {
        if result.iter().any(|a| &a.user_id == user_id) {
            continue;
        }
        let color = PALETTE
            .iter()
            .find(|c| !used.contains(c))
            .copied()
            .unwrap_or(FALLBACK_COLOR);
        if color != FALLBACK_COLOR {
            used.push(color);
        }
        result.push(UserColorAssignment {
            user_id: user_id.clone(),
            color: color.to_string(),
            assigned_at: now,
        });
    }

    result
}
