use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use cubestack_animation::Easing;

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the block tower scene. Every section falls back to its
/// defaults, so a config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub view: ViewConfig,
    pub light: LightConfig,
    pub tower: TowerConfig,
}

/// Orbit camera placement, limits and projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub distance: f32,
    pub pan: f32,
    pub tilt: f32,
    /// Pan is clamped to `[-pan_limit, pan_limit]`.
    pub pan_limit: f32,
    pub tilt_limit: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians per pixel of pointer drag.
    pub drag_sensitivity: f32,
    /// Relative distance change per wheel step.
    pub zoom_factor: f32,
    /// Radians per frame while an arrow key is held.
    pub orbit_speed: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            distance: 2.4,
            pan: 0.0,
            tilt: -PI / 25.0,
            pan_limit: PI,
            tilt_limit: PI,
            min_distance: 0.5,
            max_distance: 5.0,
            drag_sensitivity: 0.01,
            zoom_factor: 0.2,
            orbit_speed: 0.02,
            fov_y: PI / 4.0,
            aspect: 540.0 / 1080.0,
            near: 0.1,
            far: 14.0,
        }
    }
}

/// The orbiting directional light and its shadow map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Fixed tilt about the X axis, in radians.
    pub tilt: f32,
    /// Orbit speed about the Y axis, in radians per millisecond.
    pub rotation_speed: f64,
    /// Light position before the orbit is applied.
    pub position: Vec3,
    pub shadow_width: u32,
    pub shadow_height: u32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            tilt: 0.1,
            rotation_speed: 0.00003,
            position: Vec3::new(0.0, 2.0, -1.0),
            shadow_width: 540,
            shadow_height: 1080,
        }
    }
}

/// Block tower layout and timings. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    /// Edge length of a block; also the height one drop adds and one sink
    /// removes.
    pub block_size: f32,
    /// Heights of the blocks present at startup, bottom first.
    pub initial_heights: Vec<f32>,
    pub floor_y: f32,
    /// Height at which new blocks appear and swing.
    pub spawn_height: f32,
    pub drop_ms: f64,
    pub drop_easing: Easing,
    pub spawn_delay_ms: f64,
    /// Delay between a spawn and the tower sinking.
    pub sink_delay_ms: f64,
    pub sink_ms: f64,
    pub swing_period_ms: f64,
    pub swing_amplitude: f32,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            block_size: 0.4,
            initial_heights: vec![-0.7, -0.3, 0.4],
            floor_y: -0.9,
            spawn_height: 1.0,
            drop_ms: 1000.0,
            drop_easing: Easing::Linear,
            spawn_delay_ms: 1000.0,
            sink_delay_ms: 500.0,
            sink_ms: 100.0,
            swing_period_ms: 4000.0,
            swing_amplitude: 1.0,
        }
    }
}

impl SceneConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        config.validate()?;
        tracing::info!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let view = &self.view;
        if !(view.min_distance > 0.0 && view.min_distance <= view.max_distance) {
            return Err(ConfigError::Invalid(format!(
                "view distance range [{}, {}] is empty or not positive",
                view.min_distance, view.max_distance
            )));
        }
        if view.pan_limit < 0.0 || view.tilt_limit < 0.0 {
            return Err(ConfigError::Invalid("pan/tilt limits must be >= 0".into()));
        }
        if !(view.near > 0.0 && view.near < view.far) {
            return Err(ConfigError::Invalid(format!(
                "clip planes near={} far={} are invalid",
                view.near, view.far
            )));
        }
        let rates = [view.drag_sensitivity, view.zoom_factor, view.orbit_speed];
        if rates.iter().any(|r| !r.is_finite()) {
            return Err(ConfigError::Invalid("view rates must be finite".into()));
        }
        if !self.light.rotation_speed.is_finite() || !self.light.tilt.is_finite() {
            return Err(ConfigError::Invalid("light rotation must be finite".into()));
        }
        if self.light.shadow_width == 0 || self.light.shadow_height == 0 {
            return Err(ConfigError::Invalid("shadow map size must be non-zero".into()));
        }

        let tower = &self.tower;
        if tower.block_size <= 0.0 {
            return Err(ConfigError::Invalid("block_size must be > 0".into()));
        }
        if tower.initial_heights.len() < 2 {
            return Err(ConfigError::Invalid(
                "the tower needs at least two initial blocks".into(),
            ));
        }
        let timings = [
            tower.drop_ms,
            tower.spawn_delay_ms,
            tower.sink_delay_ms,
            tower.sink_ms,
            tower.swing_period_ms,
        ];
        if timings.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ConfigError::Invalid("tower timings must be >= 0".into()));
        }
        if !tower.swing_amplitude.is_finite() {
            return Err(ConfigError::Invalid("swing_amplitude must be finite".into()));
        }
        Ok(())
    }
}
