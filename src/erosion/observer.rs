//! Hooks for watching droplets as they travel.

use glam::Vec2;

use super::droplet::Droplet;
use super::hydraulic::DropReport;

/// Receives a droplet's state after every executed step.
///
/// Observers only see the simulation; they never mutate the grid.
pub trait DropObserver {
    /// Called after step `step` (zero based) has been applied.
    fn on_step(&mut self, step: usize, droplet: &Droplet);

    /// Called once when the droplet terminates.
    fn on_finish(&mut self, _report: &DropReport) {}
}

impl<F: FnMut(usize, &Droplet)> DropObserver for F {
    fn on_step(&mut self, step: usize, droplet: &Droplet) {
        self(step, droplet);
    }
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DropObserver for NoopObserver {
    fn on_step(&mut self, _step: usize, _droplet: &Droplet) {}
}

/// Records the trail of positions a droplet visited, one entry per step.
#[derive(Debug, Default, Clone)]
pub struct PathRecorder {
    pub path: Vec<Vec2>,
    pub finished: bool,
}

impl PathRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DropObserver for PathRecorder {
    fn on_step(&mut self, _step: usize, droplet: &Droplet) {
        self.path.push(droplet.position);
    }

    fn on_finish(&mut self, _report: &DropReport) {
        self.finished = true;
    }
}
