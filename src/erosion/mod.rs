//! Droplet-based hydraulic erosion.
//!
//! An [`ErosionEngine`] holds one validated [`ErosionConfig`] and mutates a
//! borrowed [`HeightGrid`](crate::terrain::HeightGrid) one droplet at a time.
//! How many droplets to run, and when, is left to the caller.

mod config;
mod droplet;
mod hydraulic;
mod observer;

pub use config::{ConfigError, ErosionConfig, VelocityModel};
pub use droplet::Droplet;
pub use hydraulic::{DropReport, ErosionEngine, ErosionError, ErosionStats, StepOutcome, Termination};
pub use observer::{DropObserver, NoopObserver, PathRecorder};
