//! Input: raw key and pointer events folded into per-tick controls.
//!
//! # Invariants
//! - The simulation consumes [`FlightControls`] and [`Action`]s, never raw events.
//! - One-shot actions are drained exactly once.

pub mod action;
mod state;

pub use action::{Action, FlightControls};
pub use state::{InputState, Key};

/// Errors from input parsing.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("unknown key: {0:?}")]
    UnknownKey(char),
}

pub fn crate_info() -> &'static str {
    "dunes-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
