//! Shared test fixtures: a scripted mock backend and payload builders.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use wander_client::payloads::{DistrictPayload, PoiPayload, RosterUserPayload, UnlockResponse};
use wander_client::{ApiError, MapBackend};

/// One scripted answer to an unlock request.
pub enum ScriptedUnlock {
    Respond(Result<UnlockResponse, ApiError>),
    /// Never answers; used to test cancellation-on-teardown.
    Hang,
}

/// Backend mock fed with canned district/roster payloads and a queue of
/// scripted unlock results.
#[derive(Default)]
pub struct MockBackend {
    pub districts: Mutex<Vec<DistrictPayload>>,
    pub roster: Mutex<Vec<RosterUserPayload>>,
    pub unlock_script: Mutex<VecDeque<ScriptedUnlock>>,
    pub unlock_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_districts(&self, rows: Vec<serde_json::Value>) {
        let payloads = rows
            .into_iter()
            .map(|row| serde_json::from_value(row).expect("district fixture must deserialize"))
            .collect();
        *self.districts.lock().unwrap() = payloads;
    }

    pub fn set_roster(&self, rows: Vec<serde_json::Value>) {
        let payloads = rows
            .into_iter()
            .map(|row| serde_json::from_value(row).expect("roster fixture must deserialize"))
            .collect();
        *self.roster.lock().unwrap() = payloads;
    }

    pub fn script_unlock(&self, result: Result<UnlockResponse, ApiError>) {
        self.unlock_script
            .lock()
            .unwrap()
            .push_back(ScriptedUnlock::Respond(result));
    }

    pub fn script_unlock_hang(&self) {
        self.unlock_script
            .lock()
            .unwrap()
            .push_back(ScriptedUnlock::Hang);
    }

    pub fn unlock_calls(&self) -> usize {
        self.unlock_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MapBackend for MockBackend {
    async fn fetch_districts(&self, _map_id: &str) -> Result<Vec<DistrictPayload>, ApiError> {
        Ok(self.districts.lock().unwrap().clone())
    }

    async fn fetch_roster(&self, _map_id: &str) -> Result<Vec<RosterUserPayload>, ApiError> {
        Ok(self.roster.lock().unwrap().clone())
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
        self.unlock_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .unlock_script
            .lock()
            .unwrap()
            .pop_front()
            .expect("no unlock result scripted");
        match scripted {
            ScriptedUnlock::Respond(result) => result,
            ScriptedUnlock::Hang => {
                // Far longer than any test runs; only cancellation ends it.
                tokio::time::sleep(Duration::from_secs(600)).await;
                unreachable!("hanging unlock should have been cancelled");
            }
        }
    }
}

/// Successful unlock response.
pub fn unlock_ok() -> Result<UnlockResponse, ApiError> {
    Ok(UnlockResponse {
        success: true,
        message: None,
        unlocked_by: None,
    })
}

/// "Already unlocked" refusal naming the current owner.
pub fn unlock_owned_by(owner: &str) -> Result<UnlockResponse, ApiError> {
    Ok(UnlockResponse {
        success: false,
        message: Some("District already unlocked".to_string()),
        unlocked_by: Some(owner.to_string()),
    })
}

/// The "Triana" district from the product's home city, locked, with a
/// GeoJSON ring in lon/lat order.
pub fn triana_row() -> serde_json::Value {
    json!({
        "id": "triana",
        "name": "Triana",
        "boundaries": {
            "type": "Polygon",
            "coordinates": [[
                [-6.003, 37.383],
                [-5.998, 37.383],
                [-5.998, 37.386],
                [-6.003, 37.386],
                [-6.003, 37.383]
            ]]
        },
        "isUnlocked": false,
        "region_assignee": {"id": "sevilla"}
    })
}

/// A small square district centered on (lat, lon), locked.
pub fn square_row(id: &str, lat: f64, lon: f64, half: f64) -> serde_json::Value {
    json!({
        "id": id,
        "name": id,
        "boundaries": {
            "type": "Polygon",
            "coordinates": [[
                [lon - half, lat - half],
                [lon + half, lat - half],
                [lon + half, lat + half],
                [lon - half, lat + half],
                [lon - half, lat - half]
            ]]
        },
        "isUnlocked": false,
        "region_assignee": {"id": "r1"}
    })
}
