//! Pure domain logic for the district-unlock engine.
//!
//! Everything in this crate is synchronous and I/O-free: the district
//! model, planar geometry primitives, GeoJSON coordinate normalization,
//! and the roster color resolver. Async orchestration lives in
//! `wander-engine`; HTTP integration lives in `wander-client`.

pub mod district;
pub mod geojson;
pub mod geometry;
pub mod palette;
pub mod types;
