use std::f32::consts::FRAC_PI_2;

use glam::{Mat3, Mat4, Vec3};

use cubestack_animation::{Animator, Oscillator, Scheduler, Tween};
use cubestack_common::Transform;

use crate::config::TowerConfig;

/// Stable identity of a block for the lifetime of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub position: Vec3,
}

/// Property a tower tween writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    BlockY(BlockId),
    FloorY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Spawn,
    Sink,
}

/// Blocks added or removed by one [`Tower::tick`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TowerUpdate {
    pub spawned: Vec<BlockId>,
    pub retired: Vec<BlockId>,
}

/// Ordered stack of blocks, bottom first, resting above a floor.
///
/// A drop runs one cycle: the top block falls onto the block below it, a new
/// block appears at spawn height and swings sideways, then every block but the
/// new one sinks by one block height together with the floor and the bottom
/// block is retired. The cycle ends once the sink has settled; drops
/// requested before then are ignored.
pub struct Tower {
    config: TowerConfig,
    blocks: Vec<Block>,
    floor_y: f32,
    next_id: u64,
    cycle_running: bool,
    sinking: bool,
    /// Block in flight and the height it lands at.
    landing: Option<(BlockId, f32)>,
    swing: Option<(BlockId, Oscillator)>,
    animator: Animator<Target>,
    scheduler: Scheduler<Phase>,
    drops: u64,
}

impl Tower {
    pub fn new(config: &TowerConfig) -> Self {
        let mut tower = Self {
            config: config.clone(),
            blocks: Vec::with_capacity(config.initial_heights.len() + 1),
            floor_y: config.floor_y,
            next_id: 0,
            cycle_running: false,
            sinking: false,
            landing: None,
            swing: None,
            animator: Animator::new(),
            scheduler: Scheduler::new(),
            drops: 0,
        };
        for &y in &config.initial_heights {
            tower.push_block(Vec3::new(0.0, y, 0.0));
        }
        tower
    }

    fn push_block(&mut self, position: Vec3) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.push(Block { id, position });
        id
    }

    /// Start a drop cycle. Returns false if one is already running or there is
    /// no block to land on.
    pub fn drop_top(&mut self) -> bool {
        if self.cycle_running || self.blocks.len() < 2 {
            return false;
        }
        let [.., below, top] = self.blocks.as_slice() else {
            return false;
        };
        let landing = below.position.y + self.config.block_size;
        let tween = Tween::new(top.position.y, landing, self.config.drop_ms)
            .with_easing(self.config.drop_easing);
        self.animator.start(Target::BlockY(top.id), tween);
        self.landing = Some((top.id, landing));
        self.scheduler.after(self.config.spawn_delay_ms, Phase::Spawn);
        self.cycle_running = true;
        self.drops += 1;
        tracing::debug!(block = top.id.0, landing, "drop started");
        true
    }

    /// Advance scheduled phases, tweens and the swing to frame time `now`.
    pub fn tick(&mut self, now: f64) -> TowerUpdate {
        let mut update = TowerUpdate::default();
        for phase in self.scheduler.tick(now) {
            match phase {
                Phase::Spawn => {
                    let id = self.push_block(Vec3::new(0.0, self.config.spawn_height, 0.0));
                    self.swing = Some((
                        id,
                        Oscillator::new(self.config.swing_period_ms, self.config.swing_amplitude),
                    ));
                    self.scheduler.after(self.config.sink_delay_ms, Phase::Sink);
                    update.spawned.push(id);
                    tracing::debug!(block = id.0, "block spawned");
                }
                Phase::Sink => {
                    if let Some(id) = self.sink() {
                        update.retired.push(id);
                    }
                    self.sinking = true;
                }
            }
        }

        let blocks = &mut self.blocks;
        let floor_y = &mut self.floor_y;
        self.animator.tick(now, |target, value| match *target {
            Target::BlockY(id) => {
                if let Some(block) = blocks.iter_mut().find(|b| b.id == id) {
                    block.position.y = value;
                }
            }
            Target::FloorY => *floor_y = value,
        });

        if self.sinking && self.animator.is_empty() {
            self.sinking = false;
            self.cycle_running = false;
            tracing::debug!(floor_y = self.floor_y, "tower settled");
        }

        self.update_swing(now);
        update
    }

    /// Lower every block except the newest and the floor by one block height,
    /// then retire the bottom block. A block still falling is taken over by
    /// its sink tween, which ends one block height below its landing.
    fn sink(&mut self) -> Option<BlockId> {
        let depth = self.config.block_size;
        let landing = self.landing.take();
        let settled = self.blocks.len().saturating_sub(1);
        for block in &self.blocks[..settled] {
            let target = Target::BlockY(block.id);
            let y = block.position.y;
            let rest = match landing {
                Some((id, landing_y)) if id == block.id => landing_y,
                _ => y,
            };
            self.animator.cancel_target(&target);
            self.animator
                .start(target, Tween::new(y, rest - depth, self.config.sink_ms));
        }
        self.animator.cancel_target(&Target::FloorY);
        self.animator.start(
            Target::FloorY,
            Tween::new(self.floor_y, self.floor_y - depth, self.config.sink_ms),
        );

        if self.blocks.is_empty() {
            return None;
        }
        let retired = self.blocks.remove(0);
        self.animator.cancel_target(&Target::BlockY(retired.id));
        tracing::debug!(block = retired.id.0, remaining = self.blocks.len(), "block retired");
        Some(retired.id)
    }

    /// The newest block swings while it waits at spawn height.
    fn update_swing(&mut self, now: f64) {
        let Some((id, oscillator)) = self.swing.as_mut() else {
            return;
        };
        let spawn_height = self.config.spawn_height;
        match self.blocks.iter_mut().find(|b| b.id == *id) {
            Some(block) if block.position.y == spawn_height => {
                block.position.x = oscillator.value(now);
            }
            _ => self.swing = None,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn floor_y(&self) -> f32 {
        self.floor_y
    }

    pub fn is_swinging(&self) -> bool {
        self.swing.is_some()
    }

    pub fn cycle_running(&self) -> bool {
        self.cycle_running
    }

    /// Number of drops started.
    pub fn drops(&self) -> u64 {
        self.drops
    }

    pub fn block_transform(&self, id: BlockId) -> Option<Transform> {
        self.block(id)
            .map(|b| Transform::at(b.position).with_scale(Vec3::splat(self.config.block_size)))
    }

    /// The floor plane, stood up from XY into XZ.
    pub fn floor_transform(&self) -> Transform {
        Transform::at(Vec3::new(0.0, self.floor_y, 0.0))
            .with_scale(Vec3::splat(2.0))
            .with_tilt(FRAC_PI_2)
    }
}

/// Matrix that transforms normals for a model matrix.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model).inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower() -> Tower {
        Tower::new(&TowerConfig::default())
    }

    fn heights(tower: &Tower) -> Vec<f32> {
        tower.blocks().iter().map(|b| b.position.y).collect()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn starts_with_configured_blocks() {
        let tower = tower();
        assert_eq!(heights(&tower), vec![-0.7, -0.3, 0.4]);
        assert_eq!(tower.floor_y(), -0.9);
        assert!(!tower.cycle_running());
    }

    #[test]
    fn drop_lands_on_block_below() {
        let mut tower = tower();
        assert!(tower.drop_top());
        tower.tick(0.0);
        tower.tick(500.0);
        assert!(close(tower.blocks()[2].position.y, 0.25));
        tower.tick(999.0);
        let update = tower.tick(1000.0);
        assert!(close(tower.blocks()[2].position.y, 0.1));
        assert_eq!(update.spawned.len(), 1);
    }

    #[test]
    fn second_drop_during_cycle_is_ignored() {
        let mut tower = tower();
        assert!(tower.drop_top());
        assert!(!tower.drop_top());
        assert_eq!(tower.drops(), 1);
    }

    #[test]
    fn full_cycle_spawns_sinks_and_retires() {
        let mut tower = tower();
        let bottom = tower.blocks()[0].id;
        tower.drop_top();
        tower.tick(0.0);

        let update = tower.tick(1000.0);
        assert_eq!(update.spawned.len(), 1);
        let spawned = update.spawned[0];
        assert_eq!(tower.len(), 4);
        assert!(tower.is_swinging());
        assert_eq!(tower.block(spawned).map(|b| b.position.y), Some(1.0));

        // The swing moves the new block sideways while it waits.
        tower.tick(2000.0);
        assert!(close(tower.block(spawned).map_or(0.0, |b| b.position.x), 1.0));

        // The sink delay counts from the first frame after the spawn.
        let update = tower.tick(2500.0);
        assert_eq!(update.retired, vec![bottom]);
        assert_eq!(tower.len(), 3);
        assert!(tower.cycle_running());

        tower.tick(2700.0);
        assert!(!tower.cycle_running());
        let h = heights(&tower);
        assert!(close(h[0], -0.3 - 0.4));
        assert!(close(h[1], 0.1 - 0.4));
        assert_eq!(h[2], 1.0);
        assert!(close(tower.floor_y(), -1.3));
    }

    #[test]
    fn swing_stops_once_dropped() {
        let mut tower = tower();
        tower.drop_top();
        tower.tick(0.0);
        tower.tick(1000.0);
        tower.tick(1001.0);
        tower.tick(1600.0);
        tower.tick(1700.0);
        assert!(tower.is_swinging());
        assert!(!tower.cycle_running());

        assert!(tower.drop_top());
        tower.tick(1800.0);
        tower.tick(1850.0);
        assert!(!tower.is_swinging());
        let x = tower.blocks()[2].position.x;
        tower.tick(2600.0);
        assert_eq!(tower.blocks()[2].position.x, x);
    }

    #[test]
    fn drop_is_refused_until_sink_settles() {
        let mut tower = tower();
        tower.drop_top();
        tower.tick(0.0);
        tower.tick(1000.0);
        tower.tick(1016.0);
        tower.tick(1516.0);
        assert!(tower.cycle_running());
        assert!(!tower.drop_top());

        tower.tick(1616.0);
        assert!(!tower.cycle_running());
        assert!(tower.drop_top());
        tower.tick(1632.0);
        tower.tick(2632.0);
        let h = heights(&tower);
        assert!(close(h[1], -0.3));
        assert!(close(h[2] - h[1], 0.4));
    }

    #[test]
    fn sink_takes_over_a_slow_drop() {
        let config = TowerConfig {
            drop_ms: 3000.0,
            ..TowerConfig::default()
        };
        let mut tower = Tower::new(&config);
        let dropped = tower.blocks()[2].id;
        tower.drop_top();
        tower.tick(0.0);
        tower.tick(1000.0);
        tower.tick(1016.0);
        tower.tick(1516.0);
        tower.tick(1616.0);
        assert!(!tower.cycle_running());

        tower.tick(4000.0);
        let h = heights(&tower);
        assert!(close(h[0], -0.7));
        assert!(close(tower.block(dropped).map_or(f32::NAN, |b| b.position.y), -0.3));
        assert!(close(h[1] - h[0], 0.4));
    }

    #[test]
    fn floor_transform_is_tilted_plane() {
        let tower = tower();
        let up = tower.floor_transform().matrix().transform_vector3(Vec3::Z);
        assert!(up.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn normal_matrix_of_uniform_scale_keeps_directions() {
        let tower = tower();
        let id = tower.blocks()[0].id;
        let model = tower.block_transform(id).map(|t| t.matrix()).unwrap_or_default();
        let n = normal_matrix(model) * Vec3::Y;
        assert!(n.normalize().abs_diff_eq(Vec3::Y, 1e-5));
    }
}
