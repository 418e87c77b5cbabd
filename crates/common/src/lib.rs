//! Shared types: GPU resource handles, fixed-function render state, transforms
//! and uniform values.

mod types;
mod uniform;

pub use types::{
    CullFace, DepthTest, FramebufferId, ProgramId, TextureId, Transform, VertexArrayId,
};
pub use uniform::UniformValue;

pub fn crate_info() -> &'static str {
    concat!("cubestack-common v", env!("CARGO_PKG_VERSION"))
}
