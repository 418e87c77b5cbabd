use glam::{Mat4, Vec3};

use cubestack_cache::Cached;

use crate::config::ViewConfig;

/// Orbit camera: pans about Y and tilts about X around the origin, at a
/// distance along the rotated Z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub pan: f32,
    pub tilt: f32,
    pub distance: f32,
    pan_limit: f32,
    tilt_limit: f32,
    min_distance: f32,
    max_distance: f32,
    zoom_factor: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new(config: &ViewConfig) -> Self {
        let mut camera = Self {
            pan: config.pan,
            tilt: config.tilt,
            distance: config.distance,
            pan_limit: config.pan_limit,
            tilt_limit: config.tilt_limit,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            zoom_factor: config.zoom_factor,
            fov_y: config.fov_y,
            aspect: config.aspect,
            near: config.near,
            far: config.far,
        };
        camera.orbit(0.0, 0.0);
        camera.zoom(0.0);
        camera
    }

    /// Add to pan and tilt, clamped to the configured limits. Returns whether
    /// the rotation changed.
    pub fn orbit(&mut self, dpan: f32, dtilt: f32) -> bool {
        let pan = (self.pan + dpan).clamp(-self.pan_limit, self.pan_limit);
        let tilt = (self.tilt + dtilt).clamp(-self.tilt_limit, self.tilt_limit);
        let changed = pan != self.pan || tilt != self.tilt;
        self.pan = pan;
        self.tilt = tilt;
        changed
    }

    /// Scale the distance by `1 + sign(steps) * zoom_factor`, clamped. Returns
    /// whether the distance changed.
    pub fn zoom(&mut self, steps: f32) -> bool {
        let sign = if steps == 0.0 { 0.0 } else { steps.signum() };
        let distance = (self.distance * (1.0 + sign * self.zoom_factor))
            .clamp(self.min_distance, self.max_distance);
        let changed = distance != self.distance;
        self.distance = distance;
        changed
    }

    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.pan) * Mat4::from_rotation_x(self.tilt)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// The camera's derived matrices as a chain of cached nodes:
/// `view_rotation` -> `view_xform` -> `inv_view_xform`.
///
/// Dirty `view_rotation` after pan/tilt changes and `view_xform` after
/// distance changes; the inverse follows on its next read.
pub struct ViewNodes<S> {
    pub view_rotation: Cached<Mat4, S>,
    /// Camera-to-world transform.
    pub view_xform: Cached<Mat4, S>,
    /// World-to-camera transform, uploaded as the view matrix.
    pub inv_view_xform: Cached<Mat4, S>,
}

impl<S: 'static> ViewNodes<S> {
    pub fn new(camera: fn(&S) -> &OrbitCamera) -> Self {
        let view_rotation = Cached::new(move |s: &S| camera(s).rotation()).named("view_rotation");

        let rotation = view_rotation.clone();
        let view_xform = Cached::with_dependencies(
            move |s: &S| {
                rotation.get(s) * Mat4::from_translation(Vec3::new(0.0, 0.0, camera(s).distance))
            },
            [view_rotation.as_dependency()],
        )
        .named("view_xform");

        let xform = view_xform.clone();
        let inv_view_xform =
            Cached::with_dependencies(move |s: &S| xform.get(s).inverse(), [view_xform.as_dependency()])
                .named("inv_view_xform");

        Self {
            view_rotation,
            view_xform,
            inv_view_xform,
        }
    }

    /// Camera position in world space.
    pub fn view_pos(&self, state: &S) -> Vec3 {
        self.view_xform.get(state).transform_point3(Vec3::ZERO)
    }
}

impl<S> Clone for ViewNodes<S> {
    fn clone(&self) -> Self {
        Self {
            view_rotation: self.view_rotation.clone(),
            view_xform: self.view_xform.clone(),
            inv_view_xform: self.inv_view_xform.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(&ViewConfig::default())
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn orbit_clamps_to_limits() {
        let mut cam = camera();
        assert!(cam.orbit(10.0, -10.0));
        assert_eq!(cam.pan, PI);
        assert_eq!(cam.tilt, -PI);
        assert!(!cam.orbit(1.0, -1.0));
    }

    #[test]
    fn zoom_scales_and_clamps() {
        let mut cam = camera();
        assert!(cam.zoom(1.0));
        assert!((cam.distance - 2.88).abs() < 1e-5);
        cam.zoom(-1.0);
        assert!((cam.distance - 2.304).abs() < 1e-5);

        for _ in 0..50 {
            cam.zoom(1.0);
        }
        assert_eq!(cam.distance, 5.0);
        assert!(!cam.zoom(1.0));
        for _ in 0..50 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.distance, 0.5);
        assert!(!cam.zoom(0.0));
    }

    #[test]
    fn view_position_sits_at_distance() {
        let mut cam = camera();
        cam.tilt = 0.0;
        let nodes = ViewNodes::new(|c: &OrbitCamera| c);
        assert!(close(nodes.view_pos(&cam), Vec3::new(0.0, 0.0, 2.4)));

        cam.pan = PI / 2.0;
        nodes.view_rotation.set_dirty();
        assert!(close(nodes.view_pos(&cam), Vec3::new(2.4, 0.0, 0.0)));
    }

    #[test]
    fn dirtying_rotation_refreshes_the_inverse() {
        let mut cam = camera();
        let nodes = ViewNodes::new(|c: &OrbitCamera| c);
        let before = nodes.inv_view_xform.get(&cam);

        cam.orbit(0.3, 0.0);
        nodes.view_rotation.set_dirty();
        let after = nodes.inv_view_xform.get(&cam);
        assert_ne!(before, after);

        let product = nodes.view_xform.get(&cam) * after;
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn zoom_needs_only_view_xform_dirty() {
        let mut cam = camera();
        let nodes = ViewNodes::new(|c: &OrbitCamera| c);
        nodes.inv_view_xform.get(&cam);
        let rotation_version = nodes.view_rotation.version();

        cam.zoom(1.0);
        nodes.view_xform.set_dirty();
        let origin = nodes.inv_view_xform.get(&cam).transform_point3(nodes.view_pos(&cam));
        assert!(close(origin, Vec3::ZERO));
        assert_eq!(nodes.view_rotation.version(), rotation_version);
    }

    #[test]
    fn unchanged_state_does_not_recompute() {
        let cam = camera();
        let nodes = ViewNodes::new(|c: &OrbitCamera| c);
        nodes.inv_view_xform.get(&cam);
        let version = nodes.inv_view_xform.version();
        nodes.inv_view_xform.get(&cam);
        nodes.view_pos(&cam);
        assert_eq!(nodes.inv_view_xform.version(), version);
    }
}
