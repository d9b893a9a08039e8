use glam::Vec2;

/// Continuous flight controls sampled every tick from held keys.
///
/// Each axis is -1, 0 or 1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlightControls {
    /// Positive pitches the nose down (W), negative pulls up (S).
    pub pitch: f32,
    /// Positive turns left (A), negative turns right (D).
    pub turn: f32,
}

/// A one-shot action produced by input and consumed by the game loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Flip the pause flag.
    TogglePause,
    /// Rotate the orbit camera by a pointer delta in pixels.
    Orbit(Vec2),
    /// Change the orbit distance by a wheel delta.
    Zoom(f32),
    /// Put the orbit camera back to its defaults.
    ResetCamera,
}
