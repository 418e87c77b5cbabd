use glam::{Mat3, Mat4, Vec3};

use cubestack_cache::TimeSensitive;

use crate::config::LightConfig;

/// Orthographic volume the shadow map covers: left, right, bottom, top, near,
/// far.
const SHADOW_VOLUME: [f32; 6] = [-2.0, 2.0, -1.0, 2.0, 0.1, 15.0];

/// Directional light orbiting the tower about Y under a fixed tilt.
///
/// All three nodes are functions of the frame time and recompute on every
/// read.
pub struct LightRig<S> {
    /// World-to-light rotation.
    pub light_rotation: TimeSensitive<Mat3, S>,
    pub inv_light_rotation: TimeSensitive<Mat3, S>,
    /// World-to-light view transform used by the shadow pass.
    pub light_xform: TimeSensitive<Mat4, S>,
}

impl<S: 'static> LightRig<S> {
    pub fn new(config: &LightConfig) -> Self {
        let tilt = config.tilt;
        let speed = config.rotation_speed;
        let position = config.position;

        let light_rotation = TimeSensitive::new(move |_: &S, time: f64| {
            Mat3::from_mat4(
                Mat4::from_rotation_x(-tilt) * Mat4::from_rotation_y((time * -speed) as f32),
            )
        });

        let rotation = light_rotation.clone();
        let inv_light_rotation =
            TimeSensitive::new(move |s: &S, time: f64| rotation.get_at(s, time).transpose());

        let inverse = inv_light_rotation.clone();
        let light_xform = TimeSensitive::new(move |s: &S, time: f64| {
            let eye = inverse.get_at(s, time) * position;
            Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
        });

        Self {
            light_rotation,
            inv_light_rotation,
            light_xform,
        }
    }

    /// Light position in world space at `time`.
    pub fn position_at(&self, state: &S, time: f64) -> Vec3 {
        self.light_xform
            .get_at(state, time)
            .inverse()
            .transform_point3(Vec3::ZERO)
    }
}

/// Projection used when rendering the shadow map.
pub fn light_projection() -> Mat4 {
    let [left, right, bottom, top, near, far] = SHADOW_VOLUME;
    Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
}

/// [`light_projection`] remapped from clip space to `[0, 1]` texture space,
/// for sampling the shadow map.
pub fn texture_light_projection() -> Mat4 {
    Mat4::from_translation(Vec3::splat(0.5)) * Mat4::from_scale(Vec3::splat(0.5)) * light_projection()
}
