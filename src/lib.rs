//! Procedural terrain from fractal noise and droplet erosion.
//!
//! A [`HeightGrid`] is populated with normalized multi-octave noise, then
//! reshaped by an [`ErosionEngine`] that releases water droplets one at a
//! time: each follows the slope, eroding where it has spare capacity and
//! depositing where it slows or climbs.

pub mod noise;
pub mod terrain;
pub mod erosion;
pub mod pipeline;

pub use noise::NoiseConfig;
pub use terrain::{populate_map, GridError, HeightGrid};
pub use erosion::{Droplet, DropObserver, DropReport, ErosionConfig, ErosionEngine, ErosionError, ErosionStats, VelocityModel};
pub use pipeline::{GenerationStage, HeightmapStage, ErosionStage, Pipeline, PipelineError, StageConfig};
