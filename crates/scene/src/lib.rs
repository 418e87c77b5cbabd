//! Block tower scene: an orbit camera over a stack of blocks lit by an
//! orbiting, shadow-casting light.
//!
//! Camera matrices are [`Cached`](cubestack_cache::Cached) nodes dirtied by
//! input; light matrices are [`TimeSensitive`](cubestack_cache::TimeSensitive)
//! nodes evaluated at the frame time. Both feed draw-call uniform producers.
//!
//! # Invariants
//! - All scene state lives in [`SceneState`] and is passed to producers by
//!   reference.
//! - Tower animation advances only inside [`StackScene::frame`], on the same
//!   clock as rendering.
//! - The sky is not drawn until its cubemap has loaded.

pub mod camera;
pub mod config;
pub mod light;
pub mod scene;
pub mod shaders;
pub mod tower;

pub use camera::{OrbitCamera, ViewNodes};
pub use config::{ConfigError, LightConfig, SceneConfig, TowerConfig, ViewConfig};
pub use light::LightRig;
pub use scene::{FrameStats, SceneError, SceneState, StackScene};
pub use tower::{Block, BlockId, Tower, TowerUpdate};

pub fn crate_info() -> &'static str {
    concat!("cubestack-scene v", env!("CARGO_PKG_VERSION"))
}
