use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::InputError;
use crate::action::{Action, FlightControls};

/// Keys the demo binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    P,
}

impl TryFrom<char> for Key {
    type Error = InputError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'W' => Ok(Key::W),
            'A' => Ok(Key::A),
            'S' => Ok(Key::S),
            'D' => Ok(Key::D),
            'P' => Ok(Key::P),
            _ => Err(InputError::UnknownKey(c)),
        }
    }
}

/// Accumulated input between two ticks.
///
/// Key presses and pointer motion arrive as events; the game loop reads
/// [`controls`](Self::controls) and drains [`take_actions`](Self::take_actions)
/// once per tick.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    dragging: bool,
    drag: Vec2,
    zoom: f32,
    pending: Vec<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        // P toggles on the press edge, not while held
        if self.held.insert(key) && key == Key::P {
            self.pending.push(Action::TogglePause);
        }
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn pointer_down(&mut self) {
        self.dragging = true;
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Pointer motion. Only counts toward orbiting while the button is down.
    pub fn pointer_moved(&mut self, delta: Vec2) {
        if self.dragging {
            self.drag += delta;
        }
    }

    pub fn scroll(&mut self, dy: f32) {
        self.zoom += dy;
    }

    pub fn reset_camera(&mut self) {
        self.pending.push(Action::ResetCamera);
    }

    pub fn controls(&self) -> FlightControls {
        let axis = |pos: Key, neg: Key| match (self.is_held(pos), self.is_held(neg)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        FlightControls {
            pitch: axis(Key::W, Key::S),
            turn: axis(Key::A, Key::D),
        }
    }

    /// Drain one-shot actions in arrival order, followed by accumulated orbit and zoom.
    pub fn take_actions(&mut self) -> Vec<Action> {
        let mut actions = std::mem::take(&mut self.pending);
        if self.drag != Vec2::ZERO {
            actions.push(Action::Orbit(std::mem::take(&mut self.drag)));
        }
        if self.zoom != 0.0 {
            actions.push(Action::Zoom(std::mem::take(&mut self.zoom)));
        }
        if !actions.is_empty() {
            tracing::trace!(count = actions.len(), "input actions drained");
        }
        actions
    }
}
