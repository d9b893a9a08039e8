//! Scene Adapter: object graphs and the renderer-agnostic scene contract.
//!
//! # Invariants
//! - Nothing outside a `SceneGraph` implementation touches renderer state.
//! - Every mesh-bearing node handed to `attach` is released exactly once
//!   after its graph is detached.
//!
//! The engine-side scene graph is an external collaborator. `RecordingScene`
//! stands in for it in tests and in the headless CLI, counting attachments
//! and resource releases so leaks show up as numbers.

mod graph;
mod recording;

pub use graph::{MeshData, SceneNode};
pub use recording::{RecordingScene, SceneGraph};

pub fn crate_info() -> &'static str {
    "dunes-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
