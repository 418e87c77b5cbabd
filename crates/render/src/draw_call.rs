use std::fmt;

use cubestack_common::{CullFace, DepthTest, ProgramId, TextureId, UniformValue, VertexArrayId};

use crate::{GraphicsBackend, RenderError, UniformLocation};

/// Produces the value of one uniform at draw time.
pub enum UniformSource<S> {
    /// Depends on scene state only.
    Static(Box<dyn Fn(&S) -> UniformValue>),
    /// Depends on scene state and the current frame time.
    Timed(Box<dyn Fn(&S, f64) -> UniformValue>),
}

impl<S> UniformSource<S> {
    pub fn evaluate(&self, state: &S, time: f64) -> UniformValue {
        match self {
            Self::Static(produce) => produce(state),
            Self::Timed(produce) => produce(state, time),
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, Self::Timed(_))
    }
}

/// Everything a draw call needs besides its program and vertex array.
pub struct DrawCallDesc<S> {
    label: String,
    uniforms: Vec<(String, UniformSource<S>)>,
    textures: Vec<(u32, TextureId)>,
    cull_face: CullFace,
    depth_test: DepthTest,
    instances: u32,
    ready: Option<Box<dyn Fn(&S) -> bool>>,
}

impl<S> DrawCallDesc<S> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            uniforms: Vec::new(),
            textures: Vec::new(),
            cull_face: CullFace::Back,
            depth_test: DepthTest::Less,
            instances: 1,
            ready: None,
        }
    }

    /// Bind a uniform to a producer reading scene state.
    pub fn uniform<V>(mut self, name: &str, produce: impl Fn(&S) -> V + 'static) -> Self
    where
        V: Into<UniformValue>,
    {
        self.uniforms.push((
            name.to_owned(),
            UniformSource::Static(Box::new(move |s| produce(s).into())),
        ));
        self
    }

    /// Bind a uniform to a producer that also receives the frame time.
    pub fn timed_uniform<V>(mut self, name: &str, produce: impl Fn(&S, f64) -> V + 'static) -> Self
    where
        V: Into<UniformValue>,
    {
        self.uniforms.push((
            name.to_owned(),
            UniformSource::Timed(Box::new(move |s, t| produce(s, t).into())),
        ));
        self
    }

    pub fn texture(mut self, unit: u32, texture: TextureId) -> Self {
        self.textures.push((unit, texture));
        self
    }

    pub fn cull_face(mut self, mode: CullFace) -> Self {
        self.cull_face = mode;
        self
    }

    pub fn depth_test(mut self, mode: DepthTest) -> Self {
        self.depth_test = mode;
        self
    }

    pub fn instances(mut self, count: u32) -> Self {
        self.instances = count;
        self
    }

    /// Skip the draw entirely until `ready` returns true.
    pub fn ready_when(mut self, ready: impl Fn(&S) -> bool + 'static) -> Self {
        self.ready = Some(Box::new(ready));
        self
    }
}

/// Result of [`DrawCall::perform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    /// The readiness predicate returned false; nothing was submitted.
    Skipped,
}

struct BoundUniform<S> {
    name: String,
    location: UniformLocation,
    source: UniformSource<S>,
}

/// A validated draw call: program, vertex array, resolved uniform locations,
/// texture bindings and fixed render state.
pub struct DrawCall<S> {
    label: String,
    program: ProgramId,
    vertex_array: VertexArrayId,
    index_count: u32,
    instances: u32,
    uniforms: Vec<BoundUniform<S>>,
    textures: Vec<(u32, TextureId)>,
    cull_face: CullFace,
    depth_test: DepthTest,
    ready: Option<Box<dyn Fn(&S) -> bool>>,
}

impl<S> DrawCall<S> {
    /// Resolve every uniform location against `program`.
    ///
    /// Fails if a uniform is not active in the program or a handle is unknown;
    /// these are setup errors and are never retried per frame.
    pub fn new<B>(
        backend: &B,
        program: ProgramId,
        vertex_array: VertexArrayId,
        desc: DrawCallDesc<S>,
    ) -> Result<Self, RenderError>
    where
        B: GraphicsBackend + ?Sized,
    {
        let program_name = backend
            .program_name(program)
            .ok_or(RenderError::UnknownProgram(program))?
            .to_owned();
        let index_count = backend
            .index_count(vertex_array)
            .ok_or(RenderError::UnknownVertexArray(vertex_array))?;

        let mut uniforms = Vec::with_capacity(desc.uniforms.len());
        for (name, source) in desc.uniforms {
            let location = backend.uniform_location(program, &name).ok_or_else(|| {
                RenderError::MissingUniform {
                    program: program_name.clone(),
                    uniform: name.clone(),
                }
            })?;
            uniforms.push(BoundUniform {
                name,
                location,
                source,
            });
        }

        for &(_, texture) in &desc.textures {
            if backend.texture_state(texture).is_none() {
                return Err(RenderError::UnknownTexture(texture));
            }
        }

        Ok(Self {
            label: desc.label,
            program,
            vertex_array,
            index_count,
            instances: desc.instances,
            uniforms,
            textures: desc.textures,
            cull_face: desc.cull_face,
            depth_test: desc.depth_test,
            ready: desc.ready,
        })
    }

    /// Whether the readiness predicate (if any) allows drawing now.
    pub fn is_ready(&self, state: &S) -> bool {
        self.ready.as_ref().is_none_or(|ready| ready(state))
    }

    /// Upload uniforms, bind textures, apply render state and submit the
    /// indexed draw. Does nothing at all while the call is not ready.
    pub fn perform<B>(&self, backend: &mut B, state: &S, time: f64) -> DrawOutcome
    where
        B: GraphicsBackend + ?Sized,
    {
        if !self.is_ready(state) {
            tracing::trace!(label = %self.label, "draw skipped, resources not ready");
            return DrawOutcome::Skipped;
        }

        backend.use_program(self.program);
        backend.bind_vertex_array(self.vertex_array);
        for uniform in &self.uniforms {
            let value = uniform.source.evaluate(state, time);
            backend.upload_uniform(uniform.location, &value);
        }
        for &(unit, texture) in &self.textures {
            backend.bind_texture(unit, texture);
        }
        backend.set_cull_face(self.cull_face);
        backend.set_depth_test(self.depth_test);
        backend.draw_indexed(self.index_count, self.instances);
        DrawOutcome::Drawn
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Uniform names in declaration order.
    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.iter().map(|u| u.name.as_str())
    }

    /// Number of uniforms whose producer reads the frame time.
    pub fn timed_uniform_count(&self) -> usize {
        self.uniforms.iter().filter(|u| u.source.is_timed()).count()
    }
}

impl<S> fmt::Debug for DrawCall<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawCall")
            .field("label", &self.label)
            .field("program", &self.program)
            .field("vertex_array", &self.vertex_array)
            .field("uniforms", &self.uniforms.len())
            .field("textures", &self.textures)
            .field("cull_face", &self.cull_face)
            .field("depth_test", &self.depth_test)
            .field("gated", &self.ready.is_some())
            .finish()
    }
}
