//! Multi-octave fractal noise over the plane.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;
use thiserror::Error;

/// Peak magnitude of simdnoise's raw 2D gradient noise at unit frequency.
const GRADIENT_AMPLITUDE: f32 = 0.0222;

/// Invalid noise parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseConfigError {
    #[error("Noise needs at least one harmonic")]
    NoHarmonics,
    #[error("Noise parameter '{field}' must be finite")]
    NotFinite { field: &'static str },
    #[error("Noise parameter '{field}' = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        range: &'static str,
    },
}

/// Configuration for multi-octave fractal noise generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// World-space origin of the sampled window.
    pub origin: Vec2,
    /// World-space extent covered by the grid along each axis.
    pub scale: f32,
    /// Number of noise octaves (1-8 typical).
    pub harmonics: u8,
    /// Amplitude multiplier per octave (typically 0.5).
    pub persistence: f32,
    /// Frequency multiplier per octave (typically 2.0).
    pub lacunarity: f32,
    /// Random seed for reproducible generation.
    pub seed: i32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            scale: 4.0,
            harmonics: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 42,
        }
    }
}

impl NoiseConfig {
    /// Creates a new noise configuration with the given seed.
    pub fn with_seed(seed: i32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Broad rolling hills: few octaves over a small window.
    pub fn smooth(seed: i32) -> Self {
        Self {
            scale: 2.0,
            harmonics: 2,
            persistence: 0.4,
            seed,
            ..Default::default()
        }
    }

    /// Broken mountainous terrain with plenty of high-frequency detail.
    pub fn rugged(seed: i32) -> Self {
        Self {
            scale: 6.0,
            harmonics: 7,
            persistence: 0.55,
            lacunarity: 2.1,
            seed,
            ..Default::default()
        }
    }

    /// Checks the parameters that would otherwise yield meaningless grids.
    pub fn validate(&self) -> Result<(), NoiseConfigError> {
        if self.harmonics == 0 {
            return Err(NoiseConfigError::NoHarmonics);
        }
        if !self.origin.is_finite() {
            return Err(NoiseConfigError::NotFinite { field: "origin" });
        }
        if !self.persistence.is_finite() {
            return Err(NoiseConfigError::NotFinite { field: "persistence" });
        }
        if !self.scale.is_finite() {
            return Err(NoiseConfigError::NotFinite { field: "scale" });
        }
        if self.scale < 0.0 {
            return Err(NoiseConfigError::OutOfRange {
                field: "scale",
                value: self.scale,
                range: "[0, inf)",
            });
        }
        if !self.lacunarity.is_finite() {
            return Err(NoiseConfigError::NotFinite { field: "lacunarity" });
        }
        if self.lacunarity <= 0.0 {
            return Err(NoiseConfigError::OutOfRange {
                field: "lacunarity",
                value: self.lacunarity,
                range: "(0, inf)",
            });
        }
        Ok(())
    }
}

#[inline]
fn to_unit(raw: f32) -> f32 {
    (raw / GRADIENT_AMPLITUDE * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// Single-octave coherent noise at `(x, y)`, remapped into [0, 1].
///
/// Pure function of its inputs: the same coordinate and seed always produce
/// the same value.
pub fn unit_noise(x: f32, y: f32, seed: i32) -> f32 {
    let raw = NoiseBuilder::gradient_2d_offset(x, 1, y, 1)
        .with_seed(seed)
        .with_freq(1.0)
        .generate()
        .0[0];

    to_unit(raw)
}

/// Samples fractal noise at a 2D world position.
///
/// Each octave's [0, 1] value is remapped to [-1, 1] before weighting.
/// Frequency grows by `lacunarity` and amplitude shrinks by `persistence`
/// per octave. The sum is not normalized; callers that need a fixed range
/// run a min-max pass over the whole grid.
pub fn sample_noise(x: f32, y: f32, config: &NoiseConfig) -> f32 {
    let mut total = 0.0f32;
    let mut frequency = 1.0f32;
    let mut amplitude = 1.0f32;

    for _ in 0..config.harmonics {
        let value = unit_noise(x * frequency, y * frequency, config.seed);
        total += (value * 2.0 - 1.0) * amplitude;
        frequency *= config.lacunarity;
        amplitude *= config.persistence;
    }

    total
}

/// Samples `count` points of fractal noise along a row.
///
/// Point `i` lies at `start + (i * spacing, 0)` and matches
/// [`sample_noise`] there. Each octave is generated with one SIMD call
/// for the whole row.
pub fn sample_noise_row(start: Vec2, spacing: f32, count: usize, config: &NoiseConfig) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }
    if spacing <= 0.0 || !spacing.is_finite() {
        return vec![sample_noise(start.x, start.y, config); count];
    }

    let mut row = vec![0.0f32; count];
    let mut frequency = 1.0f32;
    let mut amplitude = 1.0f32;

    for _ in 0..config.harmonics {
        // simdnoise samples `(offset + i) * freq`, so express the start in steps.
        let step = spacing * frequency;
        let raw = NoiseBuilder::gradient_2d_offset(start.x / spacing, count, start.y / spacing, 1)
            .with_seed(config.seed)
            .with_freq(step)
            .generate()
            .0;

        for (cell, r) in row.iter_mut().zip(raw) {
            *cell += (to_unit(r) * 2.0 - 1.0) * amplitude;
        }
        frequency *= config.lacunarity;
        amplitude *= config.persistence;
    }

    row
}
