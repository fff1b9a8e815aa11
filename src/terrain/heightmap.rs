//! Heightmap generation using fractal noise.

use glam::Vec2;
use rayon::prelude::*;
use tracing::debug;

use super::grid::{GridError, HeightGrid};
use crate::noise::{sample_noise_row, NoiseConfig};

/// Populates a `width` x `height` grid with fractal noise normalized to [0, 1].
///
/// Cell `(x, y)` samples world coordinate
/// `origin + (x / width, y / height) * scale`. After all raw samples are
/// stored a single min-max pass remaps the grid; if every sample is equal the
/// grid is left uniformly zero.
///
/// Rows are sampled in parallel since noise evaluation is pure; each row
/// takes one batched noise call per octave.
pub fn populate_map(width: usize, height: usize, config: &NoiseConfig) -> Result<HeightGrid, GridError> {
    config.validate()?;
    let mut grid = HeightGrid::new(width, height)?;
    let spacing = config.scale / width as f32;

    grid.heights_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let wy = config.origin.y + y as f32 / height as f32 * config.scale;
            let samples = sample_noise_row(Vec2::new(config.origin.x, wy), spacing, width, config);
            row.copy_from_slice(&samples);
        });

    let (raw_min, raw_max) = grid.height_range();
    debug!(width, height, raw_min, raw_max, harmonics = config.harmonics, "populated noise grid");

    grid.normalize();
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{sample_noise, NoiseConfigError};

    fn config() -> NoiseConfig {
        NoiseConfig {
            origin: Vec2::new(0.3, 0.7),
            scale: 4.0,
            harmonics: 4,
            ..NoiseConfig::with_seed(1234)
        }
    }

    #[test]
    fn test_populate_is_normalized() {
        let grid = populate_map(32, 32, &config()).unwrap();
        let (min, max) = grid.height_range();
        assert!(min.abs() < 1e-6, "min should be 0, got {}", min);
        assert!((max - 1.0).abs() < 1e-6, "max should be 1, got {}", max);
    }

    #[test]
    fn test_populate_reproducibility() {
        let a = populate_map(24, 24, &config()).unwrap();
        let b = populate_map(24, 24, &config()).unwrap();
        assert_eq!(a, b, "Same configuration should produce identical heights");
    }

    #[test]
    fn test_populate_cells_follow_world_coordinates() {
        let config = config();
        let mut raw = HeightGrid::new(12, 12).unwrap();
        for y in 0..12 {
            for x in 0..12 {
                let wx = config.origin.x + x as f32 / 12.0 * config.scale;
                let wy = config.origin.y + y as f32 / 12.0 * config.scale;
                raw.set(x, y, sample_noise(wx, wy, &config));
            }
        }
        raw.normalize();

        let grid = populate_map(12, 12, &config).unwrap();
        for (a, b) in grid.heights().iter().zip(raw.heights()) {
            assert!((a - b).abs() < 1e-2, "row sampling {} differs from pointwise {}", a, b);
        }
    }

    #[test]
    fn test_populate_rectangular() {
        let grid = populate_map(16, 8, &config()).unwrap();
        assert_eq!(grid.dimensions(), (16, 8));
        assert_eq!(grid.heights().len(), 128);
    }

    #[test]
    fn test_populate_degenerate_scale_is_zero() {
        // Zero scale makes every cell sample the origin.
        let flat = NoiseConfig {
            scale: 0.0,
            ..config()
        };
        let grid = populate_map(8, 8, &flat).unwrap();
        assert!(grid.heights().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_populate_rejects_invalid_inputs() {
        assert!(matches!(
            populate_map(1, 8, &config()),
            Err(GridError::TooSmall { .. })
        ));

        let bad = NoiseConfig {
            harmonics: 0,
            ..config()
        };
        assert_eq!(
            populate_map(8, 8, &bad),
            Err(GridError::InvalidNoise(NoiseConfigError::NoHarmonics))
        );
    }
}
