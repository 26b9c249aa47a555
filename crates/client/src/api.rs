//! REST client for the map backend HTTP endpoints.
//!
//! Wraps the backend API (district list, roster, POIs, unlock request)
//! using [`reqwest`].

use async_trait::async_trait;

use crate::backend::MapBackend;
use crate::payloads::{
    DistrictPayload, PoiPayload, RosterUserPayload, UnlockRequestBody, UnlockResponse,
};

/// HTTP client for one map backend.
pub struct MapApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request failed at the network level (timeout, DNS,
    /// connection reset). Eligible for one silent retry.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

impl ApiError {
    /// Whether the failure happened below the application level, making
    /// a silent retry reasonable.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl MapApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `https://api.example.com`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across sessions).
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Api`] containing
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MapBackend for MapApi {
    /// Fetch the districts of a map via `GET /maps/{map_id}/districts`.
    async fn fetch_districts(&self, map_id: &str) -> Result<Vec<DistrictPayload>, ApiError> {
        let response = self
            .client
            .get(format!("{}/maps/{}/districts", self.base_url, map_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the roster of a map via `GET /maps/{map_id}/users`.
    async fn fetch_roster(&self, map_id: &str) -> Result<Vec<RosterUserPayload>, ApiError> {
        let response = self
            .client
            .get(format!("{}/maps/{}/users", self.base_url, map_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the POIs of a map via `GET /maps/{map_id}/pois`.
    async fn fetch_pois(&self, map_id: &str) -> Result<Vec<PoiPayload>, ApiError> {
        let response = self
            .client
            .get(format!("{}/maps/{}/pois", self.base_url, map_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Request an unlock via
    /// `PUT /districts/unlock/{district_id}/{user_id}/{region_id}`.
    async fn unlock_district(
        &self,
        district_id: &str,
        user_id: &str,
        region_id: &str,
        color: &str,
    ) -> Result<UnlockResponse, ApiError> {
        let body = UnlockRequestBody {
            color: color.to_string(),
        };

        let response = self
            .client
            .put(format!(
                "{}/districts/unlock/{}/{}/{}",
                self.base_url, district_id, user_id, region_id,
            ))
            .json(&body)
            .send()
            .await?;

        tracing::debug!(district_id, user_id, region_id, "Unlock request sent");

        Self::parse_response(response).await
    }
}
