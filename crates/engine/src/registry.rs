//! In-memory district registry.
//!
//! The authoritative client-side view of district identity, geometry,
//! lock state, and color. All mutation is synchronous and
//! last-writer-wins; the synchronizer's confirmation always overrides
//! any optimistic guess. The registry holds no network or geometry
//! logic: callers hand it fully-built [`District`]s.

use std::collections::HashMap;

use wander_core::district::District;
use wander_core::types::{DistrictId, UserId};

/// Confirmed state snapshotted before an optimistic unlock, used to
/// roll back on rejection.
#[derive(Debug, Clone)]
struct ConfirmedSnapshot {
    is_unlocked: bool,
    unlocked_by_user_id: Option<UserId>,
    color: String,
}

impl ConfirmedSnapshot {
    fn of(district: &District) -> Self {
        Self {
            is_unlocked: district.is_unlocked,
            unlocked_by_user_id: district.unlocked_by_user_id.clone(),
            color: district.color.clone(),
        }
    }
}

/// In-memory store of districts keyed by id.
#[derive(Debug, Default)]
pub struct DistrictRegistry {
    districts: HashMap<DistrictId, District>,
    /// Rollback snapshots for districts with a pending optimistic
    /// unlock. Presence of a key marks the unlock as unconfirmed.
    pending: HashMap<DistrictId, ConfirmedSnapshot>,
}

impl DistrictRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole district set from a backend fetch.
    ///
    /// Districts with a pending optimistic unlock that are also present
    /// in the new set keep their optimistic overlay, and their rollback
    /// snapshot is re-based onto the freshly fetched confirmed state.
    /// If the fetch itself reports the district unlocked, the fetch wins
    /// and the pending entry is dropped. Pending entries for districts
    /// missing from the new set are discarded.
    pub fn load(&mut self, districts: Vec<District>) {
        let previous = std::mem::take(&mut self.districts);
        let old_pending = std::mem::take(&mut self.pending);

        for mut district in districts {
            if old_pending.contains_key(&district.id) {
                if !district.is_unlocked {
                    // Still unconfirmed: re-apply the optimistic overlay
                    // on top of the new confirmed base.
                    self.pending
                        .insert(district.id.clone(), ConfirmedSnapshot::of(&district));
                    if let Some(old) = previous.get(&district.id) {
                        district.is_unlocked = old.is_unlocked;
                        district.unlocked_by_user_id = old.unlocked_by_user_id.clone();
                        district.color = old.color.clone();
                    }
                }
            }
            self.districts.insert(district.id.clone(), district);
        }
    }

    pub fn get(&self, id: &str) -> Option<&District> {
        self.districts.get(id)
    }

    /// Cloned snapshot of every district, for rendering.
    pub fn all(&self) -> Vec<District> {
        self.districts.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// Mark a district unlocked ahead of backend confirmation.
    ///
    /// Snapshots the current confirmed state for rollback. A repeated
    /// optimistic write keeps the original snapshot, so rollback always
    /// restores the last *confirmed* state. Returns `false` for an
    /// unknown id.
    pub fn apply_optimistic_unlock(&mut self, id: &str, user_id: &str, color: &str) -> bool {
        let Some(district) = self.districts.get_mut(id) else {
            return false;
        };
        self.pending
            .entry(district.id.clone())
            .or_insert_with(|| ConfirmedSnapshot::of(district));
        district.is_unlocked = true;
        district.unlocked_by_user_id = Some(user_id.to_string());
        district.color = color.to_string();
        true
    }

    /// Record a backend-confirmed unlock, discarding any rollback
    /// snapshot. Returns `false` for an unknown id.
    pub fn confirm_unlock(&mut self, id: &str, user_id: &str, color: &str) -> bool {
        let Some(district) = self.districts.get_mut(id) else {
            return false;
        };
        district.is_unlocked = true;
        district.unlocked_by_user_id = Some(user_id.to_string());
        district.color = color.to_string();
        self.pending.remove(id);
        true
    }

    /// Roll a district back to its last confirmed state. A no-op when
    /// there is no pending optimistic write. Returns `false` for an
    /// unknown id.
    pub fn reject_unlock(&mut self, id: &str) -> bool {
        let Some(district) = self.districts.get_mut(id) else {
            return false;
        };
        if let Some(snapshot) = self.pending.remove(id) {
            district.is_unlocked = snapshot.is_unlocked;
            district.unlocked_by_user_id = snapshot.unlocked_by_user_id;
            district.color = snapshot.color;
        }
        true
    }

    /// Overwrite a district's fill color. Returns `false` for an
    /// unknown id.
    pub fn set_color(&mut self, id: &str, color: &str) -> bool {
        let Some(district) = self.districts.get_mut(id) else {
            return false;
        };
        district.color = color.to_string();
        true
    }
}
