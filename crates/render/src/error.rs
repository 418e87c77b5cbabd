use cubestack_common::{ProgramId, TextureId, VertexArrayId};

/// Setup-time rendering failures. None of these are recoverable per frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader program '{program}' failed to link: {reason}")]
    Link { program: String, reason: String },
    #[error("program '{program}' has no active uniform '{uniform}'")]
    MissingUniform { program: String, uniform: String },
    #[error("program '{program}' has no attribute '{attribute}' required by '{vertex_array}'")]
    MissingAttribute {
        program: String,
        vertex_array: String,
        attribute: String,
    },
    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramId),
    #[error("unknown vertex array {0:?}")]
    UnknownVertexArray(VertexArrayId),
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
    #[error("framebuffer '{name}' needs a depth texture, got {texture:?}")]
    NotADepthTexture { name: String, texture: TextureId },
    #[error("framebuffer stack popped while empty")]
    FramebufferUnderflow,
}
