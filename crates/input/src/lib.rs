//! Input: host pointer, wheel and keyboard events mapped to scene actions.
//!
//! # Invariants
//! - Scenes consume [`Action`]s, never raw events.
//! - Held arrow keys saturate at one step per direction regardless of key
//!   repeat.

pub mod action;
pub mod event;
pub mod hold;

pub use action::{Action, InputMap};
pub use event::{Arrow, InputEvent, Key, ParseEventError};
pub use hold::ArrowHold;

pub fn crate_info() -> &'static str {
    concat!("cubestack-input v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
