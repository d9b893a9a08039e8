//! Shared types used across the dunes crates.
//!
//! # Invariants
//! - Scene node ids are unique per instantiated node.
//! - Geometry and material ids are content-addressed: equal content, equal id.

mod types;

pub use types::{GeometryId, MaterialId, NodeId, Transform};

pub fn crate_info() -> &'static str {
    "dunes-common v0.1.0"
}
