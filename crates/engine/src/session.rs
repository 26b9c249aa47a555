//! Per-map session: location stream processing and unlock orchestration.
//!
//! [`MapSession`] owns every piece of session state (registry, fix
//! gate, pending intent, visited set, roster colors) so multiple
//! concurrent sessions (tests, multi-window) never interfere. The
//! location source pushes [`LocationUpdate`]s into an `mpsc` channel;
//! the session spawns one processing task on [`MapSession::start`] and
//! tears it down on [`MapSession::stop`] or drop via a
//! [`CancellationToken`], which also drops any unlock call still in
//! flight.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use wander_client::{ApiError, MapBackend};
use wander_core::district::District;
use wander_core::geojson;
use wander_core::geometry::{planar_distance, LatLon};
use wander_core::palette::{assign_colors, UserColorAssignment, FALLBACK_COLOR, LOCKED_GRAY};
use wander_core::types::{Timestamp, UserId};

use crate::config::EngineConfig;
use crate::events::{EngineEvent, UnlockFailureKind};
use crate::filter;
use crate::intent::{IntentState, UnlockIntent};
use crate::registry::DistrictRegistry;
use crate::sync::{RejectReason, UnlockOutcome, UnlockSynchronizer};

/// Broadcast channel capacity for engine events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Upper bound on waiting for the watch task during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// One GPS fix from the location source.
#[derive(Debug, Clone, Copy)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Source time of the fix, used to reject out-of-order duplicates.
    pub timestamp: Timestamp,
}

impl LocationFix {
    pub fn point(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

/// What the location subsystem pushes into the session.
#[derive(Debug, Clone, Copy)]
pub enum LocationUpdate {
    Fix(LocationFix),
    /// The platform denied location access. The session keeps running
    /// without live fixes.
    PermissionDenied,
}

/// Lifecycle of a map session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet watching a location stream.
    Idle,
    /// Subscribed to the location stream, waiting for fixes.
    Watching,
    /// Currently evaluating a fix against the district set.
    Evaluating,
    /// Terminal: stopped explicitly or torn down.
    Stopped,
}

impl SessionState {
    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Watching => "watching",
            SessionState::Evaluating => "evaluating",
            SessionState::Stopped => "stopped",
        }
    }
}

/// Debounce state for the fix stream.
#[derive(Debug, Default)]
struct FixGate {
    /// Timestamp of the last accepted fix.
    last_timestamp: Option<Timestamp>,
    /// Position of the last fix that was actually evaluated.
    last_evaluated: Option<LatLon>,
}

/// One user's view of one map, with all geofencing state attached.
///
/// Dropping the session cancels the watch task and any in-flight
/// unlock call.
pub struct MapSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    map_id: String,
    user_id: UserId,
    config: EngineConfig,
    backend: Arc<dyn MapBackend>,
    sync: UnlockSynchronizer,
    registry: RwLock<DistrictRegistry>,
    gate: Mutex<FixGate>,
    /// The newest in-flight intent, if any. No queueing: a newer intent
    /// for a different district supersedes this one.
    pending: Mutex<Option<UnlockIntent>>,
    /// District names that already triggered the one-time celebration.
    visited: Mutex<HashSet<String>>,
    assignments: RwLock<Vec<UserColorAssignment>>,
    /// The color this session's user stamps onto unlocked districts.
    own_color: RwLock<String>,
    state: RwLock<SessionState>,
    event_tx: broadcast::Sender<EngineEvent>,
    cancel: CancellationToken,
    watch_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl MapSession {
    /// Create an idle session for one map and one user.
    pub fn new(
        map_id: impl Into<String>,
        user_id: impl Into<String>,
        backend: Arc<dyn MapBackend>,
        config: EngineConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                map_id: map_id.into(),
                user_id: user_id.into(),
                config,
                sync: UnlockSynchronizer::new(Arc::clone(&backend)),
                backend,
                registry: RwLock::new(DistrictRegistry::new()),
                gate: Mutex::new(FixGate::default()),
                pending: Mutex::new(None),
                visited: Mutex::new(HashSet::new()),
                assignments: RwLock::new(Vec::new()),
                own_color: RwLock::new(FALLBACK_COLOR.to_string()),
                state: RwLock::new(SessionState::Idle),
                event_tx,
                cancel: CancellationToken::new(),
                watch_task: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to engine events for UI display.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.event_tx.subscribe()
    }

    pub async fn state(&self) -> SessionState {
        *self.inner.state.read().await
    }

    /// Read-only snapshot of every district, for polygon drawing.
    pub async fn districts(&self) -> Vec<District> {
        self.inner.registry.read().await.all()
    }

    pub async fn district(&self, id: &str) -> Option<District> {
        self.inner.registry.read().await.get(id).cloned()
    }

    /// Current roster color assignments.
    pub async fn assignments(&self) -> Vec<UserColorAssignment> {
        self.inner.assignments.read().await.clone()
    }

    /// The color this session's user currently holds.
    pub async fn own_color(&self) -> String {
        self.inner.own_color.read().await.clone()
    }

    /// Fetch the district set from the backend and load it into the
    /// registry, preserving any pending optimistic unlock.
    ///
    /// Malformed geometry degrades to an unusable district (excluded
    /// from containment tests and rendering) instead of failing the
    /// set. Returns the number of districts loaded.
    pub async fn refresh_districts(&self) -> Result<usize, ApiError> {
        let payloads = self.inner.backend.fetch_districts(&self.inner.map_id).await?;

        let mut unusable = 0usize;
        let districts: Vec<District> = payloads
            .into_iter()
            .map(|payload| {
                let polygon = payload
                    .boundaries
                    .as_ref()
                    .map(geojson::normalize_geometry)
                    .unwrap_or_default();
                if polygon.len() < 3 {
                    unusable += 1;
                    tracing::warn!(
                        district_id = %payload.id,
                        name = %payload.name,
                        "District geometry malformed, excluded from containment",
                    );
                }
                let mut district = District::new(
                    payload.id,
                    payload.name,
                    polygon,
                    payload.region_assignee.map(|r| r.id),
                );
                district.is_unlocked = payload.is_unlocked;
                district.unlocked_by_user_id = payload.user.map(|u| u.id);
                district.color = payload.color.unwrap_or_else(|| LOCKED_GRAY.to_string());
                district
            })
            .collect();

        let count = districts.len();
        self.inner.registry.write().await.load(districts);

        tracing::info!(
            map_id = %self.inner.map_id,
            count,
            unusable,
            "Districts loaded",
        );
        self.inner
            .publish(EngineEvent::DistrictsLoaded { count, unusable });
        Ok(count)
    }

    /// Fetch the roster and run the color resolver over it.
    ///
    /// Colors already recorded by the backend are kept; users without
    /// one receive the lowest free palette color in roster order, with
    /// the shared fallback once the palette is exhausted. Returns the
    /// roster size.
    pub async fn refresh_roster(&self) -> Result<usize, ApiError> {
        let payloads = self.inner.backend.fetch_roster(&self.inner.map_id).await?;

        let roster: Vec<UserId> = payloads.iter().map(|u| u.id.clone()).collect();

        // Backend-recorded colors take precedence over whatever this
        // session assigned earlier.
        let now = chrono::Utc::now();
        let mut existing: Vec<UserColorAssignment> = payloads
            .iter()
            .filter_map(|u| {
                u.color.clone().map(|color| UserColorAssignment {
                    user_id: u.id.clone(),
                    color,
                    assigned_at: now,
                })
            })
            .collect();
        for assignment in self.inner.assignments.read().await.iter() {
            if !existing.iter().any(|a| a.user_id == assignment.user_id) {
                existing.push(assignment.clone());
            }
        }

        let assignments = assign_colors(&roster, &existing);

        let own = assignments
            .iter()
            .find(|a| a.user_id == self.inner.user_id)
            .map(|a| a.color.clone())
            .unwrap_or_else(|| FALLBACK_COLOR.to_string());

        tracing::info!(
            map_id = %self.inner.map_id,
            roster = roster.len(),
            own_color = %own,
            "Roster colors assigned",
        );

        *self.inner.own_color.write().await = own;
        let count = assignments.len();
        *self.inner.assignments.write().await = assignments;
        Ok(count)
    }

    /// Start watching a location stream.
    ///
    /// Spawns the processing task. Only valid once, from `Idle`; later
    /// calls are ignored with a warning.
    pub async fn start(&self, updates: mpsc::Receiver<LocationUpdate>) {
        {
            let mut state = self.inner.state.write().await;
            if *state != SessionState::Idle {
                tracing::warn!(
                    map_id = %self.inner.map_id,
                    state = state.as_str(),
                    "start() ignored: session is not idle",
                );
                return;
            }
            *state = SessionState::Watching;
        }

        tracing::info!(map_id = %self.inner.map_id, "Location watch started");
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_watch_loop(inner, updates));
        *self.inner.watch_task.lock().await = Some(handle);
    }

    /// Stop the session: terminal state, cancelled watch task, dropped
    /// in-flight network calls. Idempotent.
    pub async fn stop(&self) {
        *self.inner.state.write().await = SessionState::Stopped;
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.watch_task.lock().await.take() {
            let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await;
        }
        tracing::info!(map_id = %self.inner.map_id, "Session stopped");
    }

    /// Evaluate one fix against the district set.
    ///
    /// Returns the emitted intent, if the fix produced one. The watch
    /// loop feeds fixes here and hands intents to [`MapSession::resolve`];
    /// callers embedding the engine without a stream can do the same.
    pub async fn evaluate(&self, fix: LocationFix) -> Option<UnlockIntent> {
        self.inner.process_fix(fix).await
    }

    /// Execute an intent remotely and reconcile the outcome into the
    /// registry, guarded by the intent token.
    pub async fn resolve(&self, intent: UnlockIntent) {
        self.inner.resolve_intent(intent).await;
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        // Guarantees teardown on every exit path, including panics in
        // the embedding code.
        self.inner.cancel.cancel();
    }
}

/// Receive loop: runs until the stream closes or the session is
/// cancelled.
async fn run_watch_loop(inner: Arc<SessionInner>, mut updates: mpsc::Receiver<LocationUpdate>) {
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            update = updates.recv() => match update {
                None => {
                    tracing::debug!(map_id = %inner.map_id, "Location stream closed");
                    break;
                }
                Some(LocationUpdate::PermissionDenied) => {
                    tracing::warn!(map_id = %inner.map_id, "Location permission denied");
                    inner.publish(EngineEvent::LocationPermissionDenied);
                }
                Some(LocationUpdate::Fix(fix)) => {
                    if let Some(intent) = inner.process_fix(fix).await {
                        let inner = Arc::clone(&inner);
                        tokio::spawn(async move {
                            inner.resolve_intent(intent).await;
                        });
                    }
                }
            }
        }
    }
    *inner.state.write().await = SessionState::Stopped;
}

impl SessionInner {
    fn publish(&self, event: EngineEvent) {
        // A zero-receiver send only means no UI is attached yet.
        let _ = self.event_tx.send(event);
    }

    /// Gate, evaluate, and possibly emit an intent for one fix.
    async fn process_fix(&self, fix: LocationFix) -> Option<UnlockIntent> {
        let prior = {
            let mut state = self.state.write().await;
            if *state == SessionState::Stopped {
                return None;
            }
            let prior = *state;
            *state = SessionState::Evaluating;
            prior
        };
        let intent = self.evaluate_fix(fix).await;
        {
            let mut state = self.state.write().await;
            if *state == SessionState::Evaluating {
                *state = prior;
            }
        }
        intent
    }

    async fn evaluate_fix(&self, fix: LocationFix) -> Option<UnlockIntent> {
        let point = fix.point();

        // Debounce: drop out-of-order fixes and jitter inside the
        // deadband of the last evaluated position.
        {
            let mut gate = self.gate.lock().await;
            if let Some(last) = gate.last_timestamp {
                if fix.timestamp <= last {
                    tracing::debug!(map_id = %self.map_id, "Fix rejected: not newer than last");
                    return None;
                }
            }
            if let Some(last) = gate.last_evaluated {
                if planar_distance(&point, &last) < self.config.deadband_deg {
                    tracing::debug!(map_id = %self.map_id, "Fix rejected: inside deadband");
                    return None;
                }
            }
            gate.last_timestamp = Some(fix.timestamp);
            gate.last_evaluated = Some(point);
        }

        let (district_id, district_name, region_id, is_unlocked) = {
            let registry = self.registry.read().await;
            let districts = registry.all();
            let hit = filter::find_containing(&point, &districts, &self.config)?;
            (
                hit.id.clone(),
                hit.name.clone(),
                hit.region_id.clone(),
                hit.is_unlocked,
            )
        };

        if is_unlocked {
            tracing::debug!(
                map_id = %self.map_id,
                district_id = %district_id,
                "Inside an already-unlocked district, nothing to do",
            );
            return None;
        }

        let Some(region_id) = region_id else {
            // Cannot issue an unlock without the owning region.
            tracing::warn!(
                map_id = %self.map_id,
                district_id = %district_id,
                "District has no region assigned, unlock skipped",
            );
            return None;
        };

        let mut pending = self.pending.lock().await;
        match pending.as_ref() {
            // An intent for this district is already in flight; never
            // duplicate it.
            Some(existing) if existing.district_id == district_id => {
                tracing::debug!(
                    map_id = %self.map_id,
                    district_id = %district_id,
                    token = %existing.token,
                    "Intent already pending for this district",
                );
                return None;
            }
            // A newer district supersedes the old in-flight intent; its
            // optimistic state is rolled back and any late response for
            // it will be ignored by the token guard.
            Some(superseded) => {
                tracing::info!(
                    map_id = %self.map_id,
                    superseded_district = %superseded.district_id,
                    token = %superseded.token,
                    state = IntentState::Superseded.as_str(),
                    "Superseding in-flight intent",
                );
                self.registry
                    .write()
                    .await
                    .reject_unlock(&superseded.district_id);
            }
            None => {}
        }

        let color = self.own_color.read().await.clone();
        let intent = UnlockIntent::new(
            district_id.clone(),
            region_id,
            self.user_id.clone(),
            color.clone(),
        );

        self.registry
            .write()
            .await
            .apply_optimistic_unlock(&district_id, &self.user_id, &color);
        *pending = Some(intent.clone());

        tracing::info!(
            map_id = %self.map_id,
            district_id = %district_id,
            name = %district_name,
            token = %intent.token,
            "Unlock intent emitted",
        );
        Some(intent)
    }

    /// Run the synchronizer for an intent and reconcile the outcome.
    ///
    /// Stale outcomes (the intent was superseded meanwhile) are dropped,
    /// and a session teardown cancels the remote call outright.
    async fn resolve_intent(&self, intent: UnlockIntent) {
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!(
                    district_id = %intent.district_id,
                    token = %intent.token,
                    "Unlock call dropped: session torn down",
                );
                return;
            }
            outcome = self.sync.request_unlock(&intent) => outcome,
        };

        // Token guard: only the intent currently pending may apply its
        // outcome. A response for a superseded intent must not clobber
        // newer state.
        {
            let mut pending = self.pending.lock().await;
            match pending.as_ref() {
                Some(current) if current.token == intent.token => {
                    *pending = None;
                }
                _ => {
                    tracing::info!(
                        district_id = %intent.district_id,
                        token = %intent.token,
                        "Stale unlock outcome ignored",
                    );
                    return;
                }
            }
        }

        let mut registry = self.registry.write().await;
        let name = registry
            .get(&intent.district_id)
            .map(|d| d.name.clone())
            .unwrap_or_default();

        match outcome {
            UnlockOutcome::Confirmed => {
                registry.confirm_unlock(&intent.district_id, &intent.user_id, &intent.color);
                drop(registry);

                // One celebration per district name per session, even if
                // the user leaves and re-enters later.
                let first_visit = self.visited.lock().await.insert(name.clone());
                if first_visit {
                    self.publish(EngineEvent::DistrictUnlocked {
                        district_id: intent.district_id.clone(),
                        name,
                        user_id: intent.user_id.clone(),
                        color: intent.color.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
            UnlockOutcome::Rejected(reason) => {
                registry.reject_unlock(&intent.district_id);
                drop(registry);

                let kind = match &reason {
                    RejectReason::AlreadyOwnedByOther { .. } => {
                        UnlockFailureKind::AlreadyOwnedByOther
                    }
                    RejectReason::Backend(_) => UnlockFailureKind::Rejected,
                };
                tracing::info!(
                    district_id = %intent.district_id,
                    kind = kind.as_str(),
                    "Unlock failed",
                );
                self.publish(EngineEvent::UnlockFailed {
                    district_id: intent.district_id.clone(),
                    name,
                    kind,
                    message: reason.to_string(),
                });
            }
            UnlockOutcome::Transient(message) => {
                registry.reject_unlock(&intent.district_id);
                drop(registry);

                tracing::warn!(
                    district_id = %intent.district_id,
                    kind = UnlockFailureKind::Transient.as_str(),
                    "Unlock failed after retry, manual retry possible",
                );
                self.publish(EngineEvent::UnlockFailed {
                    district_id: intent.district_id.clone(),
                    name,
                    kind: UnlockFailureKind::Transient,
                    message,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_strings() {
        assert_eq!(SessionState::Idle.as_str(), "idle");
        assert_eq!(SessionState::Watching.as_str(), "watching");
        assert_eq!(SessionState::Evaluating.as_str(), "evaluating");
        assert_eq!(SessionState::Stopped.as_str(), "stopped");
    }

    #[test]
    fn fix_point_maps_axes() {
        let fix = LocationFix {
            latitude: 37.38,
            longitude: -5.99,
            timestamp: chrono::Utc::now(),
        };
        let p = fix.point();
        assert_eq!(p.latitude, 37.38);
        assert_eq!(p.longitude, -5.99);
    }
}
