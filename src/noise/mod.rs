//! Noise generation module for terrain synthesis.
//!
//! Uses simdnoise for the per-octave coherent noise.

mod fractal;

pub use fractal::{NoiseConfig, NoiseConfigError, sample_noise, sample_noise_row, unit_noise};
