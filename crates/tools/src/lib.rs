//! Developer tooling: read-only inspection of a running game.
//!
//! # Invariants
//! - Tools never mutate the game they inspect.

mod inspector;

pub use inspector::{ChunkInfo, GameInspector, GameSummary};

pub fn crate_info() -> &'static str {
    "dunes-tools v0.1.0"
}
