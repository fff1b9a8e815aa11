//! Droplet-based hydraulic erosion.
//!
//! Each droplet is released on the grid and follows the terrain downhill,
//! picking up sediment where it has spare capacity and dropping it where it
//! slows or climbs. The grid is mutated in place; the engine never keeps a
//! reference to it between calls.

use glam::Vec2;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use super::config::{ConfigError, ErosionConfig, VelocityModel};
use super::droplet::Droplet;
use super::observer::{DropObserver, NoopObserver};
use crate::terrain::HeightGrid;

/// Errors raised by the erosion engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErosionError {
    #[error("Erosion requires a square grid, got {width}x{height}")]
    NotSquare { width: usize, height: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a droplet stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The next move would have left the grid.
    LeftGrid,
    /// The droplet used its whole step budget.
    StepBudget,
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The droplet moved and the grid was updated.
    Moved {
        h_diff: f32,
        eroded: f32,
        deposited: f32,
    },
    /// The move was rejected; the droplet stays where it died.
    LeftGrid,
}

/// Summary of one droplet's life.
#[derive(Debug, Clone, PartialEq)]
pub struct DropReport {
    pub start: Vec2,
    pub final_position: Vec2,
    /// Executed steps, including a final step that left the grid.
    pub steps: u32,
    pub termination: Termination,
    /// Sediment picked up over the whole run.
    pub eroded: f32,
    /// Sediment dropped over the whole run.
    pub deposited: f32,
}

/// Aggregate statistics over many droplets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErosionStats {
    pub drops: u64,
    pub steps: u64,
    pub left_grid: u64,
    pub exhausted: u64,
    pub eroded: f64,
    pub deposited: f64,
}

impl ErosionStats {
    pub fn record(&mut self, report: &DropReport) {
        self.drops += 1;
        self.steps += report.steps as u64;
        match report.termination {
            Termination::LeftGrid => self.left_grid += 1,
            Termination::StepBudget => self.exhausted += 1,
        }
        self.eroded += report.eroded as f64;
        self.deposited += report.deposited as f64;
    }

    pub fn merge(&mut self, other: &ErosionStats) {
        self.drops += other.drops;
        self.steps += other.steps;
        self.left_grid += other.left_grid;
        self.exhausted += other.exhausted;
        self.eroded += other.eroded;
        self.deposited += other.deposited;
    }

    /// Mean executed steps per droplet.
    pub fn mean_steps(&self) -> f64 {
        if self.drops == 0 {
            0.0
        } else {
            self.steps as f64 / self.drops as f64
        }
    }
}

/// Runs droplets over a height grid with a fixed, validated parameter set.
#[derive(Debug, Clone)]
pub struct ErosionEngine {
    config: ErosionConfig,
}

impl ErosionEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: ErosionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ErosionConfig {
        &self.config
    }

    /// Bilinear height at `pos`. See [`HeightGrid::sample`].
    pub fn height_at(&self, grid: &HeightGrid, pos: Vec2) -> f32 {
        grid.sample(pos)
    }

    /// Unit height gradient at `pos`, or zero on a flat cell.
    pub fn gradient_at(&self, grid: &HeightGrid, pos: Vec2) -> Vec2 {
        grid.gradient(pos)
    }

    /// True while the droplet lies inside `[0, size - 1]` on both axes.
    pub fn is_valid(&self, grid: &HeightGrid, droplet: &Droplet) -> bool {
        let max_x = (grid.width() - 1) as f32;
        let max_y = (grid.height() - 1) as f32;
        let p = droplet.position;
        p.x >= 0.0 && p.x <= max_x && p.y >= 0.0 && p.y <= max_y
    }

    /// Lowers every cell within `radius` of `pos` by `amount * (radius - distance)`.
    ///
    /// Weights are not normalized, so the grid loses `amount` times the sum
    /// of the weights. Returns that weight sum.
    pub fn erode_at(&self, grid: &mut HeightGrid, pos: Vec2, amount: f32) -> f32 {
        let radius = self.config.radius;
        let (width, height) = grid.dimensions();

        let min_x = (pos.x - radius).ceil().max(0.0) as usize;
        let max_x = ((pos.x + radius).floor() + 1.0).min(width as f32).max(0.0) as usize;
        let min_y = (pos.y - radius).ceil().max(0.0) as usize;
        let max_y = ((pos.y + radius).floor() + 1.0).min(height as f32).max(0.0) as usize;

        let mut weight_sum = 0.0;
        for y in min_y..max_y {
            for x in min_x..max_x {
                let distance = pos.distance(Vec2::new(x as f32, y as f32));
                if distance <= radius {
                    let weight = radius - distance;
                    let i = grid.index(x, y);
                    grid.heights_mut()[i] -= amount * weight;
                    weight_sum += weight;
                }
            }
        }
        weight_sum
    }

    /// Adds `amount` to the four corners around `pos`. See [`HeightGrid::splat`].
    pub fn deposit_at(&self, grid: &mut HeightGrid, pos: Vec2, amount: f32) {
        grid.splat(pos, amount);
    }

    /// Speed after a step with height change `h_diff`.
    fn next_velocity(&self, velocity: f32, h_diff: f32) -> f32 {
        let drop = match self.config.velocity_model {
            VelocityModel::SignedDrop => h_diff,
            VelocityModel::Descent => -h_diff,
        };
        (velocity * velocity + drop * self.config.gravity).max(0.0).sqrt()
    }

    /// Applies one step to a live droplet.
    ///
    /// The droplet must be valid on entry. If the move would leave the grid
    /// the droplet is put back and nothing else changes.
    pub fn step(&self, grid: &mut HeightGrid, droplet: &mut Droplet) -> StepOutcome {
        let cfg = &self.config;

        // Blend the heading toward downhill; a zero blend keeps the old heading.
        let gradient = self.gradient_at(grid, droplet.position);
        let blended = droplet.direction * cfg.inertia - gradient * (1.0 - cfg.inertia);
        droplet.direction = blended.try_normalize().unwrap_or(droplet.direction);

        let old = droplet.position;
        let h_old = self.height_at(grid, old);
        droplet.position += droplet.direction;

        if !self.is_valid(grid, droplet) {
            droplet.position = old;
            return StepOutcome::LeftGrid;
        }

        let h_diff = self.height_at(grid, droplet.position) - h_old;
        let mut eroded = 0.0;
        let mut deposited = 0.0;

        if h_diff > 0.0 {
            // Climbed: fill the pit behind as far as the carried load allows.
            let amount = droplet.sediment.min(h_diff);
            self.deposit_at(grid, old, amount);
            droplet.sediment -= amount;
            deposited = amount;
        } else {
            let capacity = (-h_diff).max(cfg.min_slope) * droplet.velocity * droplet.water * cfg.capacity;

            if droplet.sediment > capacity {
                let amount = (droplet.sediment - capacity) * cfg.deposition_rate;
                self.deposit_at(grid, droplet.position, amount);
                droplet.sediment -= amount;
                deposited = amount;
            } else {
                // Never dig deeper than the drop just traversed.
                let amount = ((capacity - droplet.sediment) * cfg.erosion_rate).min(-h_diff);
                if amount > 0.0 {
                    self.erode_at(grid, old, amount);
                    droplet.sediment += amount;
                    eroded = amount;
                }
            }
        }

        droplet.velocity = self.next_velocity(droplet.velocity, h_diff);
        droplet.water *= 1.0 - cfg.evaporation_rate;

        StepOutcome::Moved { h_diff, eroded, deposited }
    }

    /// Releases one droplet at a random position and runs it to completion.
    pub fn simulate_drop<R: Rng + ?Sized>(&self, grid: &mut HeightGrid, rng: &mut R) -> Result<DropReport, ErosionError> {
        self.simulate_drop_observed(grid, rng, &mut NoopObserver)
    }

    /// Like [`simulate_drop`](Self::simulate_drop), reporting every step to `observer`.
    pub fn simulate_drop_observed<R, O>(
        &self,
        grid: &mut HeightGrid,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<DropReport, ErosionError>
    where
        R: Rng + ?Sized,
        O: DropObserver + ?Sized,
    {
        ensure_square(grid)?;
        let start = Droplet::spawn(grid.size(), rng).position;
        self.simulate_drop_from(grid, start, observer)
    }

    /// Runs one droplet released at `start`.
    ///
    /// The droplet stops after `max_steps` steps or on the first step that
    /// would leave the grid, whichever comes first.
    pub fn simulate_drop_from<O: DropObserver + ?Sized>(
        &self,
        grid: &mut HeightGrid,
        start: Vec2,
        observer: &mut O,
    ) -> Result<DropReport, ErosionError> {
        ensure_square(grid)?;

        let mut droplet = Droplet::new(start);
        let mut report = DropReport {
            start,
            final_position: start,
            steps: 0,
            termination: Termination::StepBudget,
            eroded: 0.0,
            deposited: 0.0,
        };

        if !self.is_valid(grid, &droplet) {
            report.termination = Termination::LeftGrid;
            observer.on_finish(&report);
            return Ok(report);
        }

        for step in 0..self.config.max_steps {
            report.steps += 1;
            match self.step(grid, &mut droplet) {
                StepOutcome::LeftGrid => {
                    report.termination = Termination::LeftGrid;
                    break;
                }
                StepOutcome::Moved { eroded, deposited, .. } => {
                    report.eroded += eroded;
                    report.deposited += deposited;
                    observer.on_step(step as usize, &droplet);
                }
            }
        }

        report.final_position = droplet.position;
        trace!(
            steps = report.steps,
            termination = ?report.termination,
            eroded = report.eroded,
            deposited = report.deposited,
            "droplet finished"
        );
        observer.on_finish(&report);
        Ok(report)
    }

    /// Runs `count` droplets one after another on the same grid.
    pub fn simulate_drops<R: Rng + ?Sized>(
        &self,
        grid: &mut HeightGrid,
        count: u32,
        rng: &mut R,
    ) -> Result<ErosionStats, ErosionError> {
        let mut stats = ErosionStats::default();
        for _ in 0..count {
            let report = self.simulate_drop(grid, rng)?;
            stats.record(&report);
        }

        debug!(
            drops = stats.drops,
            mean_steps = stats.mean_steps(),
            eroded = stats.eroded,
            deposited = stats.deposited,
            "erosion batch complete"
        );
        Ok(stats)
    }
}

fn ensure_square(grid: &HeightGrid) -> Result<(), ErosionError> {
    if grid.is_square() {
        Ok(())
    } else {
        let (width, height) = grid.dimensions();
        Err(ErosionError::NotSquare { width, height })
    }
}
