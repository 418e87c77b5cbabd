//! Animation: one-shot interpolation timers, periodic oscillations and delayed
//! tasks, all driven by the same frame clock as rendering.
//!
//! Times are milliseconds on the host frame clock. Every timer latches its
//! start on the first frame it observes, so work queued from input handlers
//! between frames starts on the next frame.
//!
//! # Invariants
//! - A finished tween reports its exact end value and completes exactly once.
//! - Delayed tasks fire in due order, ties in scheduling order.

mod easing;
mod frame_timer;
mod oscillator;
mod scheduler;
mod tween;

pub use easing::Easing;
pub use frame_timer::FrameTimer;
pub use oscillator::Oscillator;
pub use scheduler::Scheduler;
pub use tween::{Animator, Tween, TweenId, TweenStep};

pub fn crate_info() -> &'static str {
    concat!("cubestack-animation v", env!("CARGO_PKG_VERSION"))
}
