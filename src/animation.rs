//! Rendered block positions.
//!
//! The graph stores where a block *should* be. What is on screen is the
//! output of a [`PositionAnimator`], which chases that target over several
//! frames and reports when it comes to rest. Link geometry must follow the
//! rendered position, so the reconciliation loop reads from here and is
//! re-run on every settle notification.

use indexmap::IndexMap;

use crate::config::SpringConfig;
use crate::geometry::Point;
use crate::model::BlockId;

/// Given target positions, produces continuously updated rendered positions.
pub trait PositionAnimator {
    /// Start animating `block` towards `target`. A block the animator has
    /// never seen is mounted at `target` directly, without animation.
    fn animate(&mut self, block: &BlockId, target: Point);

    /// Current rendered position, `None` when the block is not mounted.
    fn rendered(&self, block: &BlockId) -> Option<Point>;

    /// Unmount a block.
    fn remove(&mut self, block: &BlockId);

    /// Advance time by `dt` seconds. Returns the blocks that came to rest
    /// during this step, each at most once per animation.
    fn step(&mut self, dt: f32) -> Vec<BlockId>;

    /// True while at least one block is still moving.
    fn is_animating(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Spring {
    position: Point,
    velocity: Point,
    target: Point,
    at_rest: bool,
}

/// Damped harmonic spring per block, integrated in 1 ms substeps.
#[derive(Debug, Clone, Default)]
pub struct SpringAnimator {
    config: SpringConfig,
    springs: IndexMap<BlockId, Spring>,
}

const SUBSTEP: f32 = 0.001;
/// Most substeps integrated by one `step` call.
const MAX_SUBSTEPS: u32 = 10_000;

impl SpringAnimator {
    pub fn new(config: SpringConfig) -> Self {
        Self {
            config,
            springs: IndexMap::new(),
        }
    }

    /// Place a block at `position` immediately, cancelling any animation.
    pub fn jump(&mut self, block: &BlockId, position: Point) {
        self.springs.insert(
            block.clone(),
            Spring {
                position,
                velocity: Point::default(),
                target: position,
                at_rest: true,
            },
        );
    }

    fn integrate(config: &SpringConfig, s: &mut Spring, h: f32) {
        let ax = (-config.tension * (s.position.x - s.target.x) - config.friction * s.velocity.x)
            / config.mass;
        let ay = (-config.tension * (s.position.y - s.target.y) - config.friction * s.velocity.y)
            / config.mass;
        s.velocity.x += ax * h;
        s.velocity.y += ay * h;
        s.position.x += s.velocity.x * h;
        s.position.y += s.velocity.y * h;
    }

    fn is_settled(config: &SpringConfig, s: &Spring) -> bool {
        let p = config.precision;
        s.velocity.x.abs() < p
            && s.velocity.y.abs() < p
            && (s.position.x - s.target.x).abs() < p
            && (s.position.y - s.target.y).abs() < p
    }
}

impl PositionAnimator for SpringAnimator {
    fn animate(&mut self, block: &BlockId, target: Point) {
        match self.springs.get_mut(block) {
            Some(s) => {
                if s.target != target {
                    s.target = target;
                    s.at_rest = false;
                }
            }
            None => self.jump(block, target),
        }
    }

    fn rendered(&self, block: &BlockId) -> Option<Point> {
        self.springs.get(block).map(|s| s.position)
    }

    fn remove(&mut self, block: &BlockId) {
        self.springs.shift_remove(block);
    }

    fn step(&mut self, dt: f32) -> Vec<BlockId> {
        if !(dt > 0.0) {
            return Vec::new();
        }
        // Substeps never grow past SUBSTEP; time beyond the cap ends the
        // animation outright.
        let wanted = (dt / SUBSTEP).ceil().max(1.0);
        let (steps, h, overrun) = if wanted > MAX_SUBSTEPS as f32 {
            (MAX_SUBSTEPS, SUBSTEP, true)
        } else {
            (wanted as u32, dt / wanted, false)
        };
        let mut settled = Vec::new();
        for (id, s) in self.springs.iter_mut().filter(|(_, s)| !s.at_rest) {
            let mut rested = overrun;
            for _ in 0..steps {
                Self::integrate(&self.config, s, h);
                if Self::is_settled(&self.config, s) {
                    rested = true;
                    break;
                }
            }
            if rested {
                s.position = s.target;
                s.velocity = Point::default();
                s.at_rest = true;
                settled.push(id.clone());
            }
        }
        settled
    }

    fn is_animating(&self) -> bool {
        self.springs.values().any(|s| !s.at_rest)
    }
}
