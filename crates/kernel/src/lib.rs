//! Game kernel: airplane, orbit camera, canyon ring, and the tick that ties
//! them to the terrain streamer.
//!
//! # Invariants
//! - `Game::step` runs input, pause gate, asset pump, airplane, terrain, canyon, camera, in that order.
//! - Nothing advances while paused.
//! - Asset failures are logged and leave content absent; they never stop the loop.

pub mod airplane;
pub mod camera;
pub mod canyon;
pub mod game;
pub mod settings;
pub mod timer;

pub use airplane::{Airplane, AirplaneConfig};
pub use camera::{CameraConfig, OrbitCamera};
pub use canyon::{CanyonConfig, CanyonState, CanyonWalls};
pub use game::Game;
pub use settings::{AssetSettings, Settings, SettingsError};
pub use timer::{TickSample, TickTimer};

/// Errors from building the game.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Stream(#[from] dunes_stream::StreamError),
}

pub fn crate_info() -> &'static str {
    "dunes-kernel v0.1.0"
}
