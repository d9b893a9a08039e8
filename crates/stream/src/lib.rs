//! Chunked terrain streaming around a moving player.
//!
//! The world is an unbounded grid of square chunks. Each frame the
//! [`ChunkStreamer`] computes the window of chunks within the render distance
//! of the player, evicts what left it, and builds what entered it. Chunk
//! content is a pure function of the coordinate, so nothing is persisted.
//!
//! # Invariants
//! - After `advance`, the live key set equals the required window (once templates are ready).
//! - Evicting a chunk releases geometry and material for every mesh node it holds.
//! - A coordinate never holds two chunks.
//! - Revisiting a coordinate rebuilds identical placements.

mod builder;
mod config;
mod grid;
mod sampler;
mod streamer;

pub use builder::{ChunkContentBuilder, PlacedObjectSpec, PoolSizes, PropCategory, TemplatePools};
pub use config::{CategoryConfig, GroundConfig, PropConfig, StreamConfig};
pub use grid::{ChunkCoord, bounded_window, window};
pub use sampler::FieldSampler;
pub use streamer::{AdvanceReport, Chunk, ChunkStreamer, Readiness, StreamStats};

/// Errors from streaming operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid stream config: {0}")]
    InvalidConfig(String),
    #[error("stream invariant violated: {0}")]
    InvariantViolation(String),
}

pub fn crate_info() -> &'static str {
    "dunes-stream v0.1.0"
}
