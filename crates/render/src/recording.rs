use std::collections::{BTreeMap, BTreeSet, HashMap};

use cubestack_common::{
    CullFace, DepthTest, FramebufferId, ProgramId, TextureId, UniformValue, VertexArrayId,
};

use crate::{
    ClearMask, GraphicsBackend, LoadState, ProgramSource, RenderError, TextureDesc, TextureKind,
    UniformLocation, VertexArrayDesc,
};

/// A per-frame command captured by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BindFramebuffer(Option<FramebufferId>),
    Clear(ClearMask),
    UseProgram(ProgramId),
    BindVertexArray(VertexArrayId),
    Uniform {
        location: UniformLocation,
        value: UniformValue,
    },
    BindTexture {
        unit: u32,
        texture: TextureId,
    },
    CullFace(CullFace),
    DepthTest(DepthTest),
    DrawIndexed {
        index_count: u32,
        instances: u32,
    },
}

/// Running totals over everything recorded since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStats {
    pub draws: usize,
    pub indices: u64,
    pub uniform_uploads: usize,
    pub uniform_bytes: usize,
    pub texture_binds: usize,
    pub framebuffer_binds: usize,
    pub clears: usize,
    /// Uploads whose value type differs from the declared GLSL type.
    pub type_mismatches: usize,
}

#[derive(Debug)]
struct DeclaredUniform {
    index: u32,
    glsl_type: String,
}

#[derive(Debug)]
struct ProgramRecord {
    name: String,
    uniforms: BTreeMap<String, DeclaredUniform>,
    attributes: BTreeSet<String>,
}

#[derive(Debug)]
struct VertexArrayRecord {
    name: String,
    index_count: u32,
}

#[derive(Debug)]
struct TextureRecord {
    name: String,
    kind: TextureKind,
    state: LoadState,
}

#[derive(Debug)]
struct FramebufferRecord {
    name: String,
}

/// In-memory graphics backend.
///
/// Emulates linking by reading `uniform` and vertex `in` declarations out of
/// the shader source, tracks asynchronous texture loads, and records every
/// per-frame command instead of talking to a GPU. Used for headless runs and
/// tests of the draw-call contract.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    programs: Vec<ProgramRecord>,
    vertex_arrays: Vec<VertexArrayRecord>,
    textures: Vec<TextureRecord>,
    framebuffers: Vec<FramebufferRecord>,
    uniform_values: HashMap<UniformLocation, UniformValue>,
    bound_framebuffer: Option<FramebufferId>,
    commands: Vec<Command>,
    stats: RecordingStats,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last drain.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn stats(&self) -> RecordingStats {
        self.stats
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound_framebuffer
    }

    /// Finish a pending asynchronous load. Returns false if the texture is
    /// unknown or was already loaded.
    pub fn complete_load(&mut self, texture: TextureId) -> bool {
        match self.textures.get_mut(texture.0 as usize) {
            Some(record) if record.state == LoadState::Pending => {
                record.state = LoadState::Ready;
                tracing::debug!(texture = %record.name, "asynchronous load completed");
                true
            }
            _ => false,
        }
    }

    /// Finish every pending load. Returns how many completed.
    pub fn complete_all_loads(&mut self) -> usize {
        let pending: Vec<TextureId> = self
            .textures
            .iter()
            .enumerate()
            .filter(|(_, t)| t.state == LoadState::Pending)
            .map(|(i, _)| TextureId(i as u32))
            .collect();
        pending
            .into_iter()
            .filter(|&id| self.complete_load(id))
            .count()
    }

    /// Most recent value uploaded to a uniform, including program defaults.
    pub fn last_uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let location = self.uniform_location(program, name)?;
        self.uniform_values.get(&location).copied()
    }

    pub fn texture_kind(&self, texture: TextureId) -> Option<TextureKind> {
        self.textures.get(texture.0 as usize).map(|t| t.kind)
    }

    pub fn framebuffer_name(&self, framebuffer: FramebufferId) -> Option<&str> {
        self.framebuffers
            .get(framebuffer.0 as usize)
            .map(|f| f.name.as_str())
    }

    /// Human-readable digest of the commands recorded since the last drain.
    pub fn summary(&self) -> String {
        let mut draws_per_program: BTreeMap<&str, usize> = BTreeMap::new();
        let mut current = None;
        for command in &self.commands {
            match command {
                Command::UseProgram(p) => current = Some(*p),
                Command::DrawIndexed { .. } => {
                    let name = current.and_then(|p| self.program_name(p)).unwrap_or("?");
                    *draws_per_program.entry(name).or_default() += 1;
                }
                _ => {}
            }
        }

        let mut out = format!("=== Recorded commands: {} ===\n", self.commands.len());
        for (program, draws) in draws_per_program {
            out.push_str(&format!("  {program}: {draws} draw(s)\n"));
        }
        let pending = self
            .textures
            .iter()
            .filter(|t| t.state == LoadState::Pending)
            .count();
        out.push_str(&format!("Pending loads: {pending}\n"));
        out
    }

    fn record(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, RenderError> {
        for (stage, text) in [("vertex", &source.vertex), ("fragment", &source.fragment)] {
            if !text.contains("void main") {
                return Err(RenderError::Link {
                    program: source.name.clone(),
                    reason: format!("{stage} shader has no entry point"),
                });
            }
        }

        let id = ProgramId(self.programs.len() as u32);
        let mut uniforms = BTreeMap::new();
        for text in [&source.vertex, &source.fragment] {
            for (glsl_type, name) in declarations(text, "uniform") {
                let index = uniforms.len() as u32;
                uniforms
                    .entry(name)
                    .or_insert(DeclaredUniform { index, glsl_type });
            }
        }
        let attributes = declarations(&source.vertex, "in")
            .into_iter()
            .map(|(_, name)| name)
            .collect();

        let mut defaults = Vec::with_capacity(source.defaults.len());
        for (name, value) in &source.defaults {
            let declared = uniforms
                .get(name)
                .ok_or_else(|| RenderError::MissingUniform {
                    program: source.name.clone(),
                    uniform: name.clone(),
                })?;
            let location = UniformLocation {
                program: id,
                index: declared.index,
            };
            defaults.push((location, *value));
        }

        self.programs.push(ProgramRecord {
            name: source.name.clone(),
            uniforms,
            attributes,
        });
        self.uniform_values.extend(defaults);

        tracing::debug!(program = %source.name, ?id, "program linked");
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let record = self.programs.get(program.0 as usize)?;
        record.uniforms.get(name).map(|u| UniformLocation {
            program,
            index: u.index,
        })
    }

    fn program_name(&self, program: ProgramId) -> Option<&str> {
        self.programs
            .get(program.0 as usize)
            .map(|p| p.name.as_str())
    }

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc) -> Result<VertexArrayId, RenderError> {
        let program = self
            .programs
            .get(desc.program.0 as usize)
            .ok_or(RenderError::UnknownProgram(desc.program))?;
        if let Some(missing) = desc
            .attributes
            .iter()
            .find(|a| !program.attributes.contains(&a.name))
        {
            return Err(RenderError::MissingAttribute {
                program: program.name.clone(),
                vertex_array: desc.name.clone(),
                attribute: missing.name.clone(),
            });
        }

        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(VertexArrayRecord {
            name: desc.name.clone(),
            index_count: desc.index_count,
        });
        Ok(id)
    }

    fn index_count(&self, vertex_array: VertexArrayId) -> Option<u32> {
        self.vertex_arrays
            .get(vertex_array.0 as usize)
            .map(|v| v.index_count)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RenderError> {
        let id = TextureId(self.textures.len() as u32);
        let state = if desc.asynchronous {
            LoadState::Pending
        } else {
            LoadState::Ready
        };
        self.textures.push(TextureRecord {
            name: desc.name.clone(),
            kind: desc.kind,
            state,
        });
        Ok(id)
    }

    fn texture_state(&self, texture: TextureId) -> Option<LoadState> {
        self.textures.get(texture.0 as usize).map(|t| t.state)
    }

    fn create_framebuffer(
        &mut self,
        name: &str,
        depth: TextureId,
    ) -> Result<FramebufferId, RenderError> {
        match self.texture_kind(depth) {
            Some(TextureKind::Depth { .. }) => {}
            Some(_) => {
                return Err(RenderError::NotADepthTexture {
                    name: name.to_owned(),
                    texture: depth,
                });
            }
            None => return Err(RenderError::UnknownTexture(depth)),
        }
        let id = FramebufferId(self.framebuffers.len() as u32);
        self.framebuffers.push(FramebufferRecord {
            name: name.to_owned(),
        });
        Ok(id)
    }

    fn bind_framebuffer(&mut self, target: Option<FramebufferId>) {
        self.bound_framebuffer = target;
        self.stats.framebuffer_binds += 1;
        self.record(Command::BindFramebuffer(target));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.stats.clears += 1;
        self.record(Command::Clear(mask));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.record(Command::UseProgram(program));
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.record(Command::BindVertexArray(vertex_array));
    }

    fn upload_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let declared = self
            .programs
            .get(location.program.0 as usize)
            .and_then(|p| p.uniforms.values().find(|u| u.index == location.index));
        if let Some(declared) = declared {
            let sampler_slot = declared.glsl_type.starts_with("sampler")
                && matches!(value, UniformValue::Int(_));
            if !sampler_slot && declared.glsl_type != value.glsl_type() {
                self.stats.type_mismatches += 1;
                tracing::warn!(
                    declared = %declared.glsl_type,
                    uploaded = value.glsl_type(),
                    "uniform type mismatch"
                );
            }
        }

        self.stats.uniform_uploads += 1;
        self.stats.uniform_bytes += value.to_bytes().len();
        self.uniform_values.insert(location, *value);
        self.record(Command::Uniform {
            location,
            value: *value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.stats.texture_binds += 1;
        self.record(Command::BindTexture { unit, texture });
    }

    fn set_cull_face(&mut self, mode: CullFace) {
        self.record(Command::CullFace(mode));
    }

    fn set_depth_test(&mut self, mode: DepthTest) {
        self.record(Command::DepthTest(mode));
    }

    fn draw_indexed(&mut self, index_count: u32, instances: u32) {
        self.stats.draws += 1;
        self.stats.indices += u64::from(index_count) * u64::from(instances);
        self.record(Command::DrawIndexed {
            index_count,
            instances,
        });
    }
}

/// Extract `(type, name)` pairs from top-level declarations that start with
/// `keyword` (`uniform`, or `in` for vertex attributes). Precision and layout
/// qualifiers are skipped, array suffixes are dropped.
fn declarations(source: &str, keyword: &str) -> Vec<(String, String)> {
    let stripped: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or(""))
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    stripped
        .split(';')
        .filter_map(|statement| {
            // Only the tail after the last brace can be a top-level declaration.
            let tail = statement.rsplit(['{', '}']).next().unwrap_or(statement);
            let tokens: Vec<&str> = tail.split_whitespace().collect();
            let start = tokens.iter().position(|t| *t == keyword)?;
            // Qualifiers like `layout(location = 0)` may precede the keyword.
            let qualifier = |t: &&str| {
                t.contains("layout") || t.contains(')') || t.contains('=') || t.parse::<u32>().is_ok()
            };
            if !tokens[..start].iter().all(qualifier) {
                return None;
            }
            let rest = &tokens[start + 1..];
            if rest.len() < 2 {
                return None;
            }
            let name = rest[rest.len() - 1];
            let name = name.split('[').next().unwrap_or(name);
            Some((rest[rest.len() - 2].to_owned(), name.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 300 es
        precision highp float;
        uniform mat4 u_modelMatrix;
        uniform highp mat4 u_lightXform; // trailing comment
        layout(location = 0) in vec3 a_pos;
        in vec2 a_texCoord;
        out vec2 f_texCoord;
        void main() {
            f_texCoord = a_texCoord;
            gl_Position = u_lightXform * u_modelMatrix * vec4(a_pos, 1.0);
        }
        uniform float u_late;";

    const FRAGMENT: &str = "#version 300 es
        precision mediump float;
        uniform sampler2D u_shadowMap;
        uniform vec3 u_lights[4];
        in vec2 f_texCoord;
        out vec4 FragColor;
        void main() { FragColor = texture(u_shadowMap, f_texCoord); }";

    #[test]
    fn parses_uniform_declarations() {
        let found = declarations(VERTEX, "uniform");
        let names: Vec<&str> = found.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, ["u_modelMatrix", "u_lightXform", "u_late"]);
        assert_eq!(found[1].0, "mat4");

        let arrays = declarations(FRAGMENT, "uniform");
        assert_eq!(arrays[1], ("vec3".to_owned(), "u_lights".to_owned()));
    }

    #[test]
    fn parses_vertex_inputs_with_layout_qualifiers() {
        let found = declarations(VERTEX, "in");
        let names: Vec<&str> = found.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, ["a_pos", "a_texCoord"]);
    }

    #[test]
    fn program_without_entry_point_fails_to_link() {
        let mut backend = RecordingBackend::new();
        let err = backend
            .create_program(&ProgramSource::new("broken", "uniform mat4 u_x;", FRAGMENT))
            .unwrap_err();
        assert!(matches!(err, RenderError::Link { .. }));
    }

    #[test]
    fn defaults_must_name_declared_uniforms() {
        let mut backend = RecordingBackend::new();
        let ok = backend
            .create_program(&ProgramSource::new("shadow", VERTEX, FRAGMENT).with_default("u_shadowMap", 3))
            .unwrap();
        assert_eq!(backend.last_uniform(ok, "u_shadowMap"), Some(UniformValue::Int(3)));

        let err = backend
            .create_program(&ProgramSource::new("shadow", VERTEX, FRAGMENT).with_default("u_nope", 1.0_f32))
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingUniform { .. }));
    }

    #[test]
    fn vertex_array_requires_declared_attributes() {
        let mut backend = RecordingBackend::new();
        let program = backend
            .create_program(&ProgramSource::new("solid", VERTEX, FRAGMENT))
            .unwrap();
        let ok = backend.create_vertex_array(
            &VertexArrayDesc::new("cube", program, 36)
                .attribute("a_pos", 3)
                .attribute("a_texCoord", 2),
        );
        assert!(ok.is_ok());

        let err = backend
            .create_vertex_array(&VertexArrayDesc::new("cube", program, 36).attribute("a_normal", 3))
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingAttribute { ref attribute, .. } if attribute == "a_normal"));
    }

    #[test]
    fn async_textures_start_pending() {
        let mut backend = RecordingBackend::new();
        let now = backend
            .create_texture(&TextureDesc::new("floor", TextureKind::Color2d { width: 8, height: 8 }))
            .unwrap();
        let later = backend
            .create_texture(&TextureDesc::new("sky", TextureKind::Cubemap { size: 8 }).load_async())
            .unwrap();

        assert_eq!(backend.texture_state(now), Some(LoadState::Ready));
        assert_eq!(backend.texture_state(later), Some(LoadState::Pending));
        assert_eq!(backend.complete_all_loads(), 1);
        assert_eq!(backend.texture_state(later), Some(LoadState::Ready));
        assert!(!backend.complete_load(later));
    }

    #[test]
    fn framebuffer_needs_depth_texture() {
        let mut backend = RecordingBackend::new();
        let color = backend
            .create_texture(&TextureDesc::new("color", TextureKind::Color2d { width: 8, height: 8 }))
            .unwrap();
        assert!(matches!(
            backend.create_framebuffer("shadow", color),
            Err(RenderError::NotADepthTexture { .. })
        ));
    }

    #[test]
    fn uploads_count_bytes_and_type_mismatches() {
        let mut backend = RecordingBackend::new();
        let program = backend
            .create_program(&ProgramSource::new("solid", VERTEX, FRAGMENT))
            .unwrap();
        let model = backend.uniform_location(program, "u_modelMatrix").unwrap();
        let sampler = backend.uniform_location(program, "u_shadowMap").unwrap();

        backend.upload_uniform(model, &UniformValue::Mat4(glam::Mat4::IDENTITY));
        backend.upload_uniform(sampler, &UniformValue::Int(3));
        backend.upload_uniform(model, &UniformValue::Float(1.0));

        let stats = backend.stats();
        assert_eq!(stats.uniform_uploads, 3);
        assert_eq!(stats.uniform_bytes, 64 + 4 + 4);
        assert_eq!(stats.type_mismatches, 1);
    }

    #[test]
    fn summary_counts_draws_per_program() {
        let mut backend = RecordingBackend::new();
        let program = backend
            .create_program(&ProgramSource::new("solid", VERTEX, FRAGMENT))
            .unwrap();
        backend.use_program(program);
        backend.draw_indexed(36, 1);
        backend.draw_indexed(36, 1);

        let summary = backend.summary();
        assert!(summary.contains("solid: 2 draw(s)"));
        assert!(summary.contains("Pending loads: 0"));
    }
}
