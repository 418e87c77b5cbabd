use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to a linked shader program owned by a graphics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub u32);

/// Handle to a vertex array (attribute layout plus index buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexArrayId(pub u32);

/// Handle to a 2D texture or cubemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// Handle to an off-screen render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FramebufferId(pub u32);

/// Face culling mode applied before a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullFace {
    /// Culling disabled.
    None,
    #[default]
    Back,
    Front,
}

/// Depth test function applied before a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthTest {
    /// Depth testing disabled.
    None,
    #[default]
    Less,
    LessEqual,
    Always,
}

/// Spatial transform: position, rotation about the -X axis, and scale.
///
/// Matches how the scene places blocks and the floor: translate, then rotate,
/// then scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub tilt: f32,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            tilt: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_tilt(mut self, tilt: f32) -> Self {
        self.tilt = tilt;
        self
    }

    /// Model matrix: `T * R(-X, tilt) * S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_axis_angle(Vec3::NEG_X, self.tilt)
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.tilt, 0.0);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn transform_matrix_translates_then_scales() {
        let t = Transform::at(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::splat(0.4));
        let p = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.4, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn render_state_defaults() {
        assert_eq!(CullFace::default(), CullFace::Back);
        assert_eq!(DepthTest::default(), DepthTest::Less);
    }
}
