use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians per pixel of pointer drag.
    pub sensitivity: f32,
    /// Distance per unit of wheel delta.
    pub zoom_speed: f32,
    /// Height added above the orbit point.
    pub height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 30.0,
            min_distance: 10.0,
            max_distance: 60.0,
            sensitivity: 0.003,
            zoom_speed: 0.01,
            height: 10.0,
        }
    }
}

/// Follow camera orbiting the airplane in its local frame.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: CameraConfig,
    pitch: f32,
    yaw: f32,
    distance: f32,
    position: Vec3,
    target: Vec3,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let distance = config.distance;
        Self {
            config,
            pitch: 0.0,
            yaw: 0.0,
            distance,
            position: Vec3::ZERO,
            target: Vec3::ZERO,
        }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Rotate by a pointer drag in pixels. Dragging right or down lowers yaw
    /// or pitch.
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.config.sensitivity;
        self.pitch = (self.pitch - delta.y * self.config.sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn zoom(&mut self, dy: f32) {
        self.distance = (self.distance + dy * self.config.zoom_speed)
            .clamp(self.config.min_distance, self.config.max_distance);
    }

    pub fn reset(&mut self) {
        self.pitch = 0.0;
        self.yaw = 0.0;
        self.distance = self.config.distance;
    }

    /// Offset from the target in the target's local frame.
    pub fn local_offset(&self) -> Vec3 {
        let (d, p, y) = (self.distance, self.pitch, self.yaw);
        Vec3::new(
            d * p.cos() * y.sin(),
            d * p.sin() + self.config.height,
            d * p.cos() * y.cos(),
        )
    }

    /// Place the camera behind a target with the given orientation.
    pub fn follow(&mut self, target: Vec3, orientation: Quat) {
        self.position = target + orientation * self.local_offset();
        self.target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }
}
