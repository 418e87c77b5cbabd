use cubestack_common::{
    CullFace, DepthTest, FramebufferId, ProgramId, TextureId, UniformValue, VertexArrayId,
};

use crate::RenderError;

/// Location of an active uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation {
    pub program: ProgramId,
    pub index: u32,
}

/// Shader program source plus the uniform values uploaded once after linking.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
    pub defaults: Vec<(String, UniformValue)>,
}

impl ProgramSource {
    pub fn new(name: impl Into<String>, vertex: &str, fragment: &str) -> Self {
        Self {
            name: name.into(),
            vertex: vertex.to_owned(),
            fragment: fragment.to_owned(),
            defaults: Vec::new(),
        }
    }

    /// Add an initial value for a uniform that never changes per draw.
    pub fn with_default(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.defaults.push((name.to_owned(), value.into()));
        self
    }
}

/// One vertex attribute in an interleaved attribute buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesc {
    pub name: String,
    /// Component count (3 for a position, 2 for a texture coordinate).
    pub size: u32,
}

/// Vertex array layout: attributes bound against a program, plus the length of
/// the index buffer drawn with it.
#[derive(Debug, Clone)]
pub struct VertexArrayDesc {
    pub name: String,
    pub program: ProgramId,
    pub attributes: Vec<AttributeDesc>,
    pub index_count: u32,
}

impl VertexArrayDesc {
    pub fn new(name: impl Into<String>, program: ProgramId, index_count: u32) -> Self {
        Self {
            name: name.into(),
            program,
            attributes: Vec::new(),
            index_count,
        }
    }

    pub fn attribute(mut self, name: &str, size: u32) -> Self {
        self.attributes.push(AttributeDesc {
            name: name.to_owned(),
            size,
        });
        self
    }

    /// Bytes between consecutive vertices for `f32` components.
    pub fn stride(&self) -> u32 {
        self.attributes.iter().map(|a| a.size * 4).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Color2d { width: u32, height: u32 },
    Cubemap { size: u32 },
    Depth { width: u32, height: u32 },
}

/// Whether texture contents are available yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Ready,
    /// An asynchronous load was issued and has not completed.
    Pending,
}

impl LoadState {
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub name: String,
    pub kind: TextureKind,
    /// Load contents in the background instead of before returning.
    pub asynchronous: bool,
}

impl TextureDesc {
    pub fn new(name: impl Into<String>, kind: TextureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            asynchronous: false,
        }
    }

    pub fn load_async(mut self) -> Self {
        self.asynchronous = true;
        self
    }
}

/// Buffers cleared at the start of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const DEPTH: Self = Self {
        color: false,
        depth: true,
    };
    pub const COLOR_DEPTH: Self = Self {
        color: true,
        depth: true,
    };
}

/// The native graphics API seen by draw calls and scenes.
///
/// Creation methods run at setup time and fail with a [`RenderError`]. Per-draw
/// methods are infallible: by the time a draw is issued every handle has been
/// validated.
pub trait GraphicsBackend {
    /// Compile and link a program, then upload its default uniforms.
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, RenderError>;

    /// Look up an active uniform by name.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Human-readable program name, for error messages.
    fn program_name(&self, program: ProgramId) -> Option<&str>;

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc) -> Result<VertexArrayId, RenderError>;

    /// Number of indices drawn from a vertex array.
    fn index_count(&self, vertex_array: VertexArrayId) -> Option<u32>;

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RenderError>;

    fn texture_state(&self, texture: TextureId) -> Option<LoadState>;

    /// Create an off-screen target that renders depth into `depth`.
    fn create_framebuffer(
        &mut self,
        name: &str,
        depth: TextureId,
    ) -> Result<FramebufferId, RenderError>;

    /// Redirect output; `None` is the default (on-screen) framebuffer.
    fn bind_framebuffer(&mut self, target: Option<FramebufferId>);

    fn clear(&mut self, mask: ClearMask);

    fn use_program(&mut self, program: ProgramId);

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId);

    fn upload_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    fn set_cull_face(&mut self, mode: CullFace);

    fn set_depth_test(&mut self, mode: DepthTest);

    fn draw_indexed(&mut self, index_count: u32, instances: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_sums_float_attributes() {
        let desc = VertexArrayDesc::new("cube", ProgramId(0), 36)
            .attribute("a_pos", 3)
            .attribute("a_normal", 3)
            .attribute("a_texCoord", 2)
            .attribute("a_tangent", 3);
        assert_eq!(desc.stride(), 44);
    }

    #[test]
    fn program_defaults_accumulate() {
        let source = ProgramSource::new("solid", "", "")
            .with_default("u_texDiffuse", 0)
            .with_default("u_ambient", 0.1_f32);
        assert_eq!(source.defaults.len(), 2);
        assert_eq!(source.defaults[0].1, UniformValue::Int(0));
    }
}
