use dunes_common::Transform;
use dunes_input::FlightControls;
use glam::{EulerRot, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Fraction of the remaining tilt closed each tick.
const TILT_LERP: f32 = 0.1;
/// Propeller spin per tick, radians.
const PROPELLER_SPIN: f32 = 0.5;

/// Flight tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirplaneConfig {
    pub start: Vec3,
    /// World units travelled per tick.
    pub speed: f32,
    /// Yaw change per tick while turning, radians.
    pub turn_speed: f32,
    /// Largest pitch or roll, radians.
    pub max_tilt: f32,
    pub min_altitude: f32,
    pub max_altitude: f32,
}

impl Default for AirplaneConfig {
    fn default() -> Self {
        Self {
            start: Vec3::new(0.0, 20.0, 0.0),
            speed: 0.5,
            turn_speed: 0.03,
            max_tilt: 0.3,
            min_altitude: 5.0,
            max_altitude: 50.0,
        }
    }
}

/// Arcade airplane kinematics. No physics: the plane always flies forward.
#[derive(Debug, Clone)]
pub struct Airplane {
    config: AirplaneConfig,
    position: Vec3,
    yaw: f32,
    /// Pitch on x, roll on y.
    tilt: Vec2,
    propeller: f32,
}

impl Airplane {
    pub fn new(config: AirplaneConfig) -> Self {
        let position = config.start;
        Self {
            config,
            position,
            yaw: 0.0,
            tilt: Vec2::ZERO,
            propeller: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.tilt.x
    }

    pub fn roll(&self) -> f32 {
        self.tilt.y
    }

    pub fn propeller_angle(&self) -> f32 {
        self.propeller
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.tilt.x, self.yaw, self.tilt.y)
    }

    /// Unit vector the nose points along.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.orientation(),
            scale: Vec3::ONE,
        }
    }

    /// Advance one tick under the given controls.
    pub fn update(&mut self, controls: FlightControls) {
        let max = self.config.max_tilt;
        let target_pitch = -controls.pitch.clamp(-1.0, 1.0) * max;
        let target_roll = controls.turn.clamp(-1.0, 1.0) * max;
        self.tilt.x += (target_pitch - self.tilt.x) * TILT_LERP;
        self.tilt.y += (target_roll - self.tilt.y) * TILT_LERP;
        self.yaw += controls.turn.clamp(-1.0, 1.0) * self.config.turn_speed;

        self.position += self.forward() * self.config.speed;
        self.position.y = self
            .position
            .y
            .clamp(self.config.min_altitude, self.config.max_altitude);
        self.propeller += PROPELLER_SPIN;
    }

    /// Move the plane without changing its heading. Altitude is clamped.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.position.y = position
            .y
            .clamp(self.config.min_altitude, self.config.max_altitude);
    }
}
