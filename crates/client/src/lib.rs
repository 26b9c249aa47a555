//! HTTP client for the map backend.
//!
//! Provides typed payload structs for the backend's district, roster,
//! POI, and unlock endpoints, a [`reqwest`]-based implementation, and
//! the [`backend::MapBackend`] trait that lets the engine run against a
//! mock in tests.

pub mod api;
pub mod backend;
pub mod payloads;

pub use api::{ApiError, MapApi};
pub use backend::MapBackend;
