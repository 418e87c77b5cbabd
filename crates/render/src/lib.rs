//! Rendering adapter: backend-agnostic draw calls.
//!
//! A [`DrawCall`] bundles a program, a vertex array, named uniform producers,
//! texture bindings and fixed render state. Uniform locations are resolved once
//! at construction; per frame, producers are evaluated against scene state and
//! the frame time and uploaded through a [`GraphicsBackend`].
//!
//! # Invariants
//! - A draw call whose readiness predicate returns false touches no backend
//!   state.
//! - Missing uniforms, attributes and link failures surface at setup, never
//!   per frame.
//!
//! # Workaround
//! [`RecordingBackend`] stands in for a GPU backend: it validates programs
//! against their source text and records commands. The trait is stable; a
//! native backend plugs in without changing scenes.

mod backend;
mod draw_call;
mod error;
mod framebuffer;
mod recording;

pub use backend::{
    AttributeDesc, ClearMask, GraphicsBackend, LoadState, ProgramSource, TextureDesc, TextureKind,
    UniformLocation, VertexArrayDesc,
};
pub use draw_call::{DrawCall, DrawCallDesc, DrawOutcome, UniformSource};
pub use error::RenderError;
pub use framebuffer::FramebufferStack;
pub use recording::{Command, RecordingBackend, RecordingStats};

pub fn crate_info() -> &'static str {
    concat!("cubestack-render v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
