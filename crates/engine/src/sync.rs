//! Unlock synchronizer.
//!
//! Turns an [`UnlockIntent`] into an idempotent remote call and maps the
//! backend's answer to a typed outcome. Network-level failures get one
//! silent retry; application-level rejections are never retried. The
//! caller (the session) applies the outcome to the registry, guarded by
//! the intent token.

use std::sync::Arc;

use wander_client::{ApiError, MapBackend};
use wander_core::types::UserId;

use crate::intent::UnlockIntent;

/// Terminal result of an unlock attempt, from the caller's perspective.
#[derive(Debug, Clone)]
pub enum UnlockOutcome {
    /// The backend confirmed the unlock, including the idempotent case
    /// where this user had already unlocked the district.
    Confirmed,
    /// The backend explicitly refused. Optimistic state must be rolled
    /// back; not retryable.
    Rejected(RejectReason),
    /// The call failed below the application level even after the
    /// silent retry. Distinct from `Rejected` so the UI can offer a
    /// manual retry instead of giving up.
    Transient(String),
}

/// Why the backend refused an unlock.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RejectReason {
    /// A different user already holds the district.
    #[error("district already unlocked by another user")]
    AlreadyOwnedByOther {
        /// The holding user, when the backend names one.
        owner: Option<UserId>,
    },

    /// Any other application-level refusal, with the backend's message.
    #[error("unlock rejected: {0}")]
    Backend(String),
}

/// Performs unlock calls against the remote source of truth.
pub struct UnlockSynchronizer {
    backend: Arc<dyn MapBackend>,
}

impl UnlockSynchronizer {
    pub fn new(backend: Arc<dyn MapBackend>) -> Self {
        Self { backend }
    }

    /// Execute an unlock intent remotely and classify the result.
    ///
    /// Idempotent from the caller's view: a "already unlocked by this
    /// user" response maps to [`UnlockOutcome::Confirmed`]. Exactly one
    /// silent retry on a network-level error; an HTTP-level error
    /// response or an explicit rejection is never retried.
    pub async fn request_unlock(&self, intent: &UnlockIntent) -> UnlockOutcome {
        let first = self.call(intent).await;

        let response = match first {
            Ok(response) => response,
            Err(e) if e.is_network() => {
                tracing::warn!(
                    district_id = %intent.district_id,
                    token = %intent.token,
                    error = %e,
                    "Unlock request failed at network level, retrying once",
                );
                match self.call(intent).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(
                            district_id = %intent.district_id,
                            token = %intent.token,
                            error = %e,
                            "Unlock retry failed",
                        );
                        return UnlockOutcome::Transient(e.to_string());
                    }
                }
            }
            Err(e) => return UnlockOutcome::Transient(e.to_string()),
        };

        Self::classify(intent, response)
    }

    async fn call(
        &self,
        intent: &UnlockIntent,
    ) -> Result<wander_client::payloads::UnlockResponse, ApiError> {
        self.backend
            .unlock_district(
                &intent.district_id,
                &intent.user_id,
                &intent.region_id,
                &intent.color,
            )
            .await
    }

    fn classify(
        intent: &UnlockIntent,
        response: wander_client::payloads::UnlockResponse,
    ) -> UnlockOutcome {
        if response.success {
            tracing::info!(
                district_id = %intent.district_id,
                user_id = %intent.user_id,
                "Unlock confirmed",
            );
            return UnlockOutcome::Confirmed;
        }

        match response.unlocked_by {
            // Already unlocked by this user: idempotent success.
            Some(owner) if owner == intent.user_id => {
                tracing::debug!(
                    district_id = %intent.district_id,
                    "District already unlocked by this user",
                );
                UnlockOutcome::Confirmed
            }
            Some(owner) => {
                tracing::info!(
                    district_id = %intent.district_id,
                    owner = %owner,
                    "District already owned by another user",
                );
                UnlockOutcome::Rejected(RejectReason::AlreadyOwnedByOther { owner: Some(owner) })
            }
            None => {
                let message = response
                    .message
                    .unwrap_or_else(|| "unlock refused".to_string());
                tracing::info!(
                    district_id = %intent.district_id,
                    message = %message,
                    "Unlock rejected by backend",
                );
                UnlockOutcome::Rejected(RejectReason::Backend(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use wander_client::payloads::{DistrictPayload, PoiPayload, RosterUserPayload, UnlockResponse};

    /// Backend stub returning a scripted sequence of unlock results.
    struct ScriptedBackend {
        results: Mutex<Vec<Result<UnlockResponse, ApiError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(results: Vec<Result<UnlockResponse, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MapBackend for ScriptedBackend {
        async fn fetch_districts(&self, _map_id: &str) -> Result<Vec<DistrictPayload>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_roster(&self, _map_id: &str) -> Result<Vec<RosterUserPayload>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_pois(&self, _map_id: &str) -> Result<Vec<PoiPayload>, ApiError> {
            Ok(Vec::new())
        }

        async fn unlock_district(
            &self,
            _district_id: &str,
            _user_id: &str,
            _region_id: &str,
            _color: &str,
        ) -> Result<UnlockResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.lock().unwrap().remove(0)
        }
    }

    fn intent() -> UnlockIntent {
        UnlockIntent::new("d1".into(), "r1".into(), "u1".into(), "#e53935".into())
    }

    fn ok(success: bool, unlocked_by: Option<&str>) -> Result<UnlockResponse, ApiError> {
        Ok(UnlockResponse {
            success,
            message: (!success).then(|| "District already unlocked".to_string()),
            unlocked_by: unlocked_by.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn success_is_confirmed() {
        let backend = ScriptedBackend::new(vec![ok(true, None)]);
        let sync = UnlockSynchronizer::new(backend.clone());
        assert_matches!(sync.request_unlock(&intent()).await, UnlockOutcome::Confirmed);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn already_unlocked_by_same_user_is_confirmed() {
        // Idempotence: two calls for an already-confirmed district both
        // come back Confirmed, one backend call each.
        let backend = ScriptedBackend::new(vec![ok(false, Some("u1")), ok(false, Some("u1"))]);
        let sync = UnlockSynchronizer::new(backend.clone());
        assert_matches!(sync.request_unlock(&intent()).await, UnlockOutcome::Confirmed);
        assert_matches!(sync.request_unlock(&intent()).await, UnlockOutcome::Confirmed);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn already_unlocked_by_other_user_is_rejected() {
        let backend = ScriptedBackend::new(vec![ok(false, Some("u2"))]);
        let sync = UnlockSynchronizer::new(backend);
        let outcome = sync.request_unlock(&intent()).await;
        assert_matches!(
            outcome,
            UnlockOutcome::Rejected(RejectReason::AlreadyOwnedByOther { owner: Some(o) })
                if o == "u2"
        );
    }

    #[tokio::test]
    async fn refusal_without_owner_is_backend_rejection() {
        let backend = ScriptedBackend::new(vec![ok(false, None)]);
        let sync = UnlockSynchronizer::new(backend);
        assert_matches!(
            sync.request_unlock(&intent()).await,
            UnlockOutcome::Rejected(RejectReason::Backend(_))
        );
    }

    #[tokio::test]
    async fn network_failure_gets_one_silent_retry() {
        let backend = ScriptedBackend::new(vec![
            Err(ApiError::Network("timeout".into())),
            ok(true, None),
        ]);
        let sync = UnlockSynchronizer::new(backend.clone());
        assert_matches!(sync.request_unlock(&intent()).await, UnlockOutcome::Confirmed);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_transient() {
        let backend = ScriptedBackend::new(vec![
            Err(ApiError::Network("timeout".into())),
            Err(ApiError::Network("reset".into())),
        ]);
        let sync = UnlockSynchronizer::new(backend.clone());
        assert_matches!(sync.request_unlock(&intent()).await, UnlockOutcome::Transient(_));
        assert_eq!(backend.calls(), 2, "exactly one retry, no more");
    }

    #[tokio::test]
    async fn http_error_is_transient_without_retry() {
        let backend = ScriptedBackend::new(vec![Err(ApiError::Api {
            status: 500,
            body: "boom".into(),
        })]);
        let sync = UnlockSynchronizer::new(backend.clone());
        assert_matches!(sync.request_unlock(&intent()).await, UnlockOutcome::Transient(_));
        assert_eq!(backend.calls(), 1, "application-level failures are not retried");
    }
}
