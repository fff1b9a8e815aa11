//! The simulated water particle.

use glam::Vec2;
use rand::Rng;

/// A single water droplet travelling over the height grid.
///
/// Created fresh for every simulated drop and discarded once it leaves the
/// grid or runs out of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Droplet {
    /// Continuous position in grid coordinates.
    pub position: Vec2,
    /// Unit heading.
    pub direction: Vec2,
    pub velocity: f32,
    pub water: f32,
    pub sediment: f32,
}

impl Droplet {
    /// A droplet at rest at `position`, heading along +x.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            direction: Vec2::X,
            velocity: 0.0,
            water: 1.0,
            sediment: 0.0,
        }
    }

    /// A droplet at a uniformly random position in `[0, size - 1]` on both axes.
    pub fn spawn<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let max = (size.saturating_sub(1)) as f32;
        Self::new(Vec2::new(rng.gen_range(0.0..=max), rng.gen_range(0.0..=max)))
    }
}
