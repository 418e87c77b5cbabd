use glam::{Mat3, Mat4, Vec3};
use serde::Serialize;

use cubestack_animation::FrameTimer;
use cubestack_common::{CullFace, DepthTest, FramebufferId, ProgramId, TextureId, VertexArrayId};
use cubestack_input::{Action, ArrowHold, InputEvent, InputMap};
use cubestack_render::{
    ClearMask, DrawCall, DrawCallDesc, DrawOutcome, FramebufferStack, GraphicsBackend,
    ProgramSource, RenderError, TextureDesc, TextureKind, VertexArrayDesc,
};

use crate::camera::{OrbitCamera, ViewNodes};
use crate::config::{ConfigError, SceneConfig};
use crate::light::{LightRig, light_projection, texture_light_projection};
use crate::shaders;
use crate::tower::{BlockId, Tower, normal_matrix};

const CUBE_INDICES: u32 = 36;
const PLANE_INDICES: u32 = 6;
const SKY_INDICES: u32 = 36;
const MATERIAL_TEXTURE_SIZE: u32 = 1024;
const SKY_FACE_SIZE: u32 = 1024;
const FRAME_HISTORY: usize = 120;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("render setup failed: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Mutable scene state read by every producer and mutated by input and
/// animation between draws.
pub struct SceneState {
    pub camera: OrbitCamera,
    pub tower: Tower,
    /// Set each frame from the sky cubemap's load state.
    pub sky_ready: bool,
}

/// What one call to [`StackScene::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    pub time: f64,
    pub drawn: usize,
    pub skipped: usize,
    pub blocks: usize,
    pub floor_y: f32,
    pub sky_ready: bool,
    /// Recomputations of the camera transform so far.
    pub view_version: u64,
}

struct Material {
    diffuse: TextureId,
    specular: TextureId,
    normal: TextureId,
}

/// Backend handles created at setup.
struct Resources {
    cube_program: ProgramId,
    floor_program: ProgramId,
    sky_program: ProgramId,
    shadow_program: ProgramId,
    cube_vao: VertexArrayId,
    floor_vao: VertexArrayId,
    sky_vao: VertexArrayId,
    shadow_cube_vao: VertexArrayId,
    shadow_floor_vao: VertexArrayId,
    cube_material: Material,
    floor_material: Material,
    sky_cubemap: TextureId,
    shadow_depth: TextureId,
    shadow_framebuffer: FramebufferId,
}

struct BlockDraws {
    id: BlockId,
    beauty: DrawCall<SceneState>,
    shadow: DrawCall<SceneState>,
}

/// The block tower scene: a shadow pass into an off-screen depth target
/// followed by a beauty pass of blocks, floor and sky.
pub struct StackScene {
    config: SceneConfig,
    state: SceneState,
    view: ViewNodes<SceneState>,
    light: LightRig<SceneState>,
    input: InputMap,
    hold: ArrowHold,
    resources: Resources,
    blocks: Vec<BlockDraws>,
    floor: DrawCall<SceneState>,
    floor_shadow: DrawCall<SceneState>,
    sky: DrawCall<SceneState>,
    framebuffers: FramebufferStack,
    timer: FrameTimer,
    frame: u64,
}

impl StackScene {
    /// Create programs, geometry, textures and draw calls. Any missing uniform,
    /// attribute or link failure aborts setup.
    pub fn setup<B>(backend: &mut B, config: SceneConfig) -> Result<Self, SceneError>
    where
        B: GraphicsBackend + ?Sized,
    {
        config.validate()?;
        let _span = tracing::info_span!("scene_setup").entered();

        let resources = create_resources(backend, &config)?;
        let state = SceneState {
            camera: OrbitCamera::new(&config.view),
            tower: Tower::new(&config.tower),
            sky_ready: false,
        };
        let view = ViewNodes::new(|s: &SceneState| &s.camera);
        let light = LightRig::new(&config.light);

        let blocks = state
            .tower
            .blocks()
            .iter()
            .map(|b| block_draws(backend, &resources, &view, &light, b.id))
            .collect::<Result<Vec<_>, _>>()?;

        let floor_model = |s: &SceneState| s.tower.floor_transform().matrix();
        let floor = DrawCall::new(
            backend,
            resources.floor_program,
            resources.floor_vao,
            solid_uniforms(DrawCallDesc::new("floor"), &view, &light)
                .uniform("u_modelMatrix", floor_model)
                .uniform("u_normalMatrix", move |s| normal_matrix(floor_model(s)))
                .texture(0, resources.floor_material.diffuse)
                .texture(1, resources.floor_material.specular)
                .texture(2, resources.floor_material.normal)
                .texture(3, resources.shadow_depth),
        )?;
        let floor_shadow = DrawCall::new(
            backend,
            resources.shadow_program,
            resources.shadow_floor_vao,
            shadow_uniforms(DrawCallDesc::new("floor-shadow"), &light)
                .uniform("u_modelMatrix", floor_model),
        )?;

        let light_rotation = light.light_rotation.clone();
        let view_rotation = view.view_rotation.clone();
        let sky = DrawCall::new(
            backend,
            resources.sky_program,
            resources.sky_vao,
            DrawCallDesc::new("sky")
                .timed_uniform("u_lightRotation", move |s, t| light_rotation.get_at(s, t))
                .uniform("u_viewRotation", move |s| Mat3::from_mat4(view_rotation.get(s)))
                .texture(0, resources.sky_cubemap)
                .cull_face(CullFace::None)
                .depth_test(DepthTest::LessEqual)
                .ready_when(|s| s.sky_ready),
        )?;

        tracing::info!(
            blocks = blocks.len(),
            shadow_map = ?(config.light.shadow_width, config.light.shadow_height),
            "scene ready"
        );

        Ok(Self {
            input: InputMap {
                drag_sensitivity: config.view.drag_sensitivity,
            },
            config,
            state,
            view,
            light,
            hold: ArrowHold::new(),
            resources,
            blocks,
            floor,
            floor_shadow,
            sky,
            framebuffers: FramebufferStack::new(),
            timer: FrameTimer::new(FRAME_HISTORY),
            frame: 0,
        })
    }

    /// React to one input event. Camera changes dirty the matching cached
    /// node; a drop starts the tower cycle on the next frame.
    pub fn handle(&mut self, event: &InputEvent) -> Action {
        let action = self.input.map(event);
        match action {
            Action::Orbit { pan, tilt } => {
                if self.state.camera.orbit(pan, tilt) {
                    self.view.view_rotation.set_dirty();
                }
            }
            Action::Zoom { steps } => {
                if self.state.camera.zoom(steps) {
                    self.view.view_xform.set_dirty();
                }
            }
            Action::Steer { arrow, pressed } => self.hold.apply(arrow, pressed),
            Action::Drop => {
                if !self.state.tower.drop_top() {
                    tracing::debug!("drop ignored, cycle running");
                }
            }
            Action::Noop => {}
        }
        action
    }

    /// Render one frame at `time` (milliseconds on the host frame clock).
    pub fn frame<B>(&mut self, backend: &mut B, time: f64) -> Result<FrameStats, SceneError>
    where
        B: GraphicsBackend + ?Sized,
    {
        let _span = tracing::info_span!("frame", index = self.frame).entered();
        self.timer.mark(time);
        self.state.sky_ready = backend
            .texture_state(self.resources.sky_cubemap)
            .is_some_and(|s| s.is_ready());

        if !self.hold.is_idle() {
            let speed = self.config.view.orbit_speed;
            if self
                .state
                .camera
                .orbit(self.hold.pan() * speed, self.hold.tilt() * speed)
            {
                self.view.view_rotation.set_dirty();
            }
        }

        let update = self.state.tower.tick(time);
        for id in update.spawned {
            let draws = block_draws(backend, &self.resources, &self.view, &self.light, id)?;
            self.blocks.push(draws);
        }
        if !update.retired.is_empty() {
            self.blocks.retain(|d| !update.retired.contains(&d.id));
        }

        let mut outcomes = Vec::with_capacity(2 * self.blocks.len() + 3);

        self.framebuffers
            .push(backend, self.resources.shadow_framebuffer);
        backend.clear(ClearMask::DEPTH);
        for draws in &self.blocks {
            outcomes.push(draws.shadow.perform(backend, &self.state, time));
        }
        outcomes.push(self.floor_shadow.perform(backend, &self.state, time));
        self.framebuffers.pop(backend)?;

        backend.clear(ClearMask::COLOR_DEPTH);
        for draws in &self.blocks {
            outcomes.push(draws.beauty.perform(backend, &self.state, time));
        }
        outcomes.push(self.floor.perform(backend, &self.state, time));
        outcomes.push(self.sky.perform(backend, &self.state, time));

        let drawn = outcomes.iter().filter(|&&o| o == DrawOutcome::Drawn).count();
        let stats = FrameStats {
            frame: self.frame,
            time,
            drawn,
            skipped: outcomes.len() - drawn,
            blocks: self.state.tower.len(),
            floor_y: self.state.tower.floor_y(),
            sky_ready: self.state.sky_ready,
            view_version: self.view.view_xform.version(),
        };
        tracing::trace!(?stats, "frame rendered");
        self.frame += 1;
        Ok(stats)
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn view(&self) -> &ViewNodes<SceneState> {
        &self.view
    }

    pub fn light(&self) -> &LightRig<SceneState> {
        &self.light
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn sky_texture(&self) -> TextureId {
        self.resources.sky_cubemap
    }

    pub fn shadow_framebuffer(&self) -> FramebufferId {
        self.resources.shadow_framebuffer
    }

    /// Draw calls issued per frame once every resource is ready.
    pub fn draw_call_count(&self) -> usize {
        2 * self.blocks.len() + 3
    }

    pub fn camera_position(&self) -> Vec3 {
        self.view.view_pos(&self.state)
    }
}

fn solid_program(name: &str, ambient: f32, specular: f32, shininess: f32) -> ProgramSource {
    ProgramSource::new(name, shaders::SOLID_VERTEX, shaders::SOLID_FRAGMENT)
        .with_default("u_ambient", ambient)
        .with_default("u_specular", specular)
        .with_default("u_shininess", shininess)
        .with_default("u_lightColor", Vec3::ONE)
        .with_default("u_texDiffuse", 0)
        .with_default("u_texSpecular", 1)
        .with_default("u_texNormal", 2)
        .with_default("u_texShadow", 3)
        .with_default("u_lightProjection", texture_light_projection())
}

fn solid_layout(name: &str, program: ProgramId, index_count: u32) -> VertexArrayDesc {
    VertexArrayDesc::new(name, program, index_count)
        .attribute("a_pos", 3)
        .attribute("a_texCoord", 2)
        .attribute("a_normal", 3)
        .attribute("a_tangent", 3)
}

fn material<B>(backend: &mut B, prefix: &str) -> Result<Material, RenderError>
where
    B: GraphicsBackend + ?Sized,
{
    let kind = TextureKind::Color2d {
        width: MATERIAL_TEXTURE_SIZE,
        height: MATERIAL_TEXTURE_SIZE,
    };
    Ok(Material {
        diffuse: backend.create_texture(&TextureDesc::new(format!("{prefix}-diffuse"), kind))?,
        specular: backend.create_texture(&TextureDesc::new(format!("{prefix}-specular"), kind))?,
        normal: backend.create_texture(&TextureDesc::new(format!("{prefix}-normal"), kind))?,
    })
}

fn create_resources<B>(backend: &mut B, config: &SceneConfig) -> Result<Resources, RenderError>
where
    B: GraphicsBackend + ?Sized,
{
    let camera_projection = OrbitCamera::new(&config.view).projection();

    let cube_program = backend.create_program(
        &solid_program("cube-shader", 0.3, 0.5, 48.0)
            .with_default("u_cameraProjection", camera_projection),
    )?;
    let floor_program = backend.create_program(
        &solid_program("floor-shader", 0.2, 0.35, 64.0)
            .with_default("u_cameraProjection", camera_projection),
    )?;
    let sky_program = backend.create_program(
        &ProgramSource::new("sky-shader", shaders::SKY_VERTEX, shaders::SKY_FRAGMENT)
            .with_default("u_cameraProjection", camera_projection)
            .with_default("u_skybox", 0),
    )?;
    let shadow_program = backend.create_program(
        &ProgramSource::new(
            "shadow-shader",
            shaders::SHADOW_VERTEX,
            shaders::SHADOW_FRAGMENT,
        )
        .with_default("u_lightProjection", light_projection()),
    )?;

    let cube_vao = backend.create_vertex_array(&solid_layout("cube-vao", cube_program, CUBE_INDICES))?;
    let floor_vao =
        backend.create_vertex_array(&solid_layout("floor-vao", floor_program, PLANE_INDICES))?;
    let sky_vao = backend.create_vertex_array(
        &VertexArrayDesc::new("sky-vao", sky_program, SKY_INDICES).attribute("a_pos", 3),
    )?;
    let shadow_cube_vao = backend.create_vertex_array(
        &VertexArrayDesc::new("shadow-cube-vao", shadow_program, CUBE_INDICES).attribute("a_pos", 3),
    )?;
    let shadow_floor_vao = backend.create_vertex_array(
        &VertexArrayDesc::new("shadow-floor-vao", shadow_program, PLANE_INDICES)
            .attribute("a_pos", 3),
    )?;

    let cube_material = material(backend, "cube")?;
    let floor_material = material(backend, "floor")?;
    let sky_cubemap = backend.create_texture(
        &TextureDesc::new(
            "sky-texture",
            TextureKind::Cubemap {
                size: SKY_FACE_SIZE,
            },
        )
        .load_async(),
    )?;
    let shadow_depth = backend.create_texture(&TextureDesc::new(
        "shadow-depth",
        TextureKind::Depth {
            width: config.light.shadow_width,
            height: config.light.shadow_height,
        },
    ))?;
    let shadow_framebuffer = backend.create_framebuffer("shadow-framebuffer", shadow_depth)?;

    Ok(Resources {
        cube_program,
        floor_program,
        sky_program,
        shadow_program,
        cube_vao,
        floor_vao,
        sky_vao,
        shadow_cube_vao,
        shadow_floor_vao,
        cube_material,
        floor_material,
        sky_cubemap,
        shadow_depth,
        shadow_framebuffer,
    })
}

/// Light and camera uniforms shared by every lit solid.
fn solid_uniforms(
    desc: DrawCallDesc<SceneState>,
    view: &ViewNodes<SceneState>,
    light: &LightRig<SceneState>,
) -> DrawCallDesc<SceneState> {
    let light_xform = light.light_xform.clone();
    let inv_light_rotation = light.inv_light_rotation.clone();
    let inv_view_xform = view.inv_view_xform.clone();
    let nodes = view.clone();
    desc.timed_uniform("u_lightXform", move |s, t| light_xform.get_at(s, t))
        .timed_uniform("u_invLightRotation", move |s, t| inv_light_rotation.get_at(s, t))
        .uniform("u_viewXform", move |s| inv_view_xform.get(s))
        .uniform("u_viewPos", move |s| nodes.view_pos(s))
        .cull_face(CullFace::Back)
        .depth_test(DepthTest::Less)
}

fn shadow_uniforms(
    desc: DrawCallDesc<SceneState>,
    light: &LightRig<SceneState>,
) -> DrawCallDesc<SceneState> {
    let light_xform = light.light_xform.clone();
    desc.timed_uniform("u_lightXform", move |s, t| light_xform.get_at(s, t))
        .cull_face(CullFace::Back)
        .depth_test(DepthTest::Less)
}

fn block_model(state: &SceneState, id: BlockId) -> Mat4 {
    state
        .tower
        .block_transform(id)
        .map(|t| t.matrix())
        .unwrap_or_default()
}

fn block_draws<B>(
    backend: &B,
    resources: &Resources,
    view: &ViewNodes<SceneState>,
    light: &LightRig<SceneState>,
    id: BlockId,
) -> Result<BlockDraws, RenderError>
where
    B: GraphicsBackend + ?Sized,
{
    let material = &resources.cube_material;
    let beauty = DrawCall::new(
        backend,
        resources.cube_program,
        resources.cube_vao,
        solid_uniforms(DrawCallDesc::new(format!("block-{}", id.0)), view, light)
            .uniform("u_modelMatrix", move |s| block_model(s, id))
            .uniform("u_normalMatrix", move |s| normal_matrix(block_model(s, id)))
            .texture(0, material.diffuse)
            .texture(1, material.specular)
            .texture(2, material.normal)
            .texture(3, resources.shadow_depth),
    )?;
    let shadow = DrawCall::new(
        backend,
        resources.shadow_program,
        resources.shadow_cube_vao,
        shadow_uniforms(DrawCallDesc::new(format!("block-{}-shadow", id.0)), light)
            .uniform("u_modelMatrix", move |s| block_model(s, id)),
    )?;
    Ok(BlockDraws { id, beauty, shadow })
}
