//! Geofencing and district-unlock session engine.
//!
//! One [`session::MapSession`] owns all state for one map view: the
//! district registry, the location stream processor, the in-flight
//! unlock intent, and the engine event channel. Rendering surfaces are
//! thin adapters over [`session::MapSession::districts`] snapshots and
//! [`session::MapSession::subscribe`] events; no geofencing logic lives
//! outside this crate.

pub mod config;
pub mod events;
pub mod filter;
pub mod intent;
pub mod registry;
pub mod session;
pub mod sync;

pub use config::EngineConfig;
pub use events::EngineEvent;
pub use intent::UnlockIntent;
pub use session::{LocationFix, LocationUpdate, MapSession, SessionState};
pub use sync::{RejectReason, UnlockOutcome, UnlockSynchronizer};
