//! Row-major scalar height grid and its bilinear sampling kernels.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::noise::NoiseConfigError;

/// Errors raised while constructing or populating a height grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Grid must be at least 2x2, got {width}x{height}")]
    TooSmall { width: usize, height: usize },
    #[error("Expected {expected} heights for the grid, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Invalid noise configuration: {0}")]
    InvalidNoise(#[from] NoiseConfigError),
}

/// A flat, row-major field of terrain heights.
///
/// Values are unconstrained: noise population leaves them in [0, 1] but
/// erosion is free to push them outside that range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    heights: Vec<f32>,
}

/// Corner indices and fractional offsets of the cell containing a position.
#[derive(Debug, Clone, Copy)]
struct Cell {
    i00: usize,
    i10: usize,
    i01: usize,
    i11: usize,
    u: f32,
    v: f32,
}

impl HeightGrid {
    /// Creates a grid of the given dimensions filled with zeros.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Self::from_heights(width, height, vec![0.0; width * height])
    }

    /// Creates a square grid of side `size` filled with zeros.
    pub fn square(size: usize) -> Result<Self, GridError> {
        Self::new(size, size)
    }

    /// Wraps existing row-major heights.
    pub fn from_heights(width: usize, height: usize, heights: Vec<f32>) -> Result<Self, GridError> {
        if width < 2 || height < 2 {
            return Err(GridError::TooSmall { width, height });
        }
        if heights.len() != width * height {
            return Err(GridError::LengthMismatch {
                expected: width * height,
                actual: heights.len(),
            });
        }
        Ok(Self { width, height, heights })
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Side length of a square grid (the width).
    pub fn size(&self) -> usize {
        self.width
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Row-major index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Height at `(x, y)`. Panics if the coordinate lies outside the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.heights[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let i = self.index(x, y);
        self.heights[i] = value;
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn heights_mut(&mut self) -> &mut [f32] {
        &mut self.heights
    }

    /// Minimum and maximum height over the whole grid.
    pub fn height_range(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), &h| (min.min(h), max.max(h)))
    }

    /// Sum of all heights.
    pub fn total(&self) -> f64 {
        self.heights.iter().map(|&h| h as f64).sum()
    }

    pub fn mean(&self) -> f32 {
        (self.total() / self.heights.len() as f64) as f32
    }

    /// Linearly remaps the grid so its range becomes exactly [0, 1].
    ///
    /// A grid whose samples are all equal has no range to stretch and is
    /// flattened to zero instead.
    pub fn normalize(&mut self) {
        let (min, max) = self.height_range();
        let range = max - min;

        if range <= 0.0 || !range.is_finite() {
            self.heights.fill(0.0);
            return;
        }

        for h in &mut self.heights {
            *h = (*h - min) / range;
        }
    }

    /// Locates the cell whose four corners surround `pos`.
    ///
    /// The lower corner is clamped to `size - 2` so that a position lying
    /// exactly on the far edge resolves to the last cell with a fraction of 1.
    #[inline]
    fn cell(&self, pos: Vec2) -> Cell {
        let x = (pos.x.floor().max(0.0) as usize).min(self.width - 2);
        let y = (pos.y.floor().max(0.0) as usize).min(self.height - 2);

        let i00 = self.index(x, y);
        Cell {
            i00,
            i10: i00 + 1,
            i01: i00 + self.width,
            i11: i00 + 1 + self.width,
            u: pos.x - x as f32,
            v: pos.y - y as f32,
        }
    }

    /// Bilinearly interpolated height at a continuous position.
    pub fn sample(&self, pos: Vec2) -> f32 {
        let c = self.cell(pos);
        let h = &self.heights;

        let r1 = lerp(h[c.i00], h[c.i10], c.u);
        let r2 = lerp(h[c.i01], h[c.i11], c.u);
        lerp(r1, r2, c.v)
    }

    /// Unit-length height gradient at a continuous position.
    ///
    /// Each axis derivative blends the forward differences of the two cell
    /// edges along that axis. A flat cell yields the zero vector.
    pub fn gradient(&self, pos: Vec2) -> Vec2 {
        let c = self.cell(pos);
        let h = &self.heights;

        Vec2::new(
            (1.0 - c.v) * (h[c.i10] - h[c.i00]) + c.v * (h[c.i11] - h[c.i01]),
            (1.0 - c.u) * (h[c.i01] - h[c.i00]) + c.u * (h[c.i11] - h[c.i10]),
        )
        .normalize_or_zero()
    }

    /// Adds `amount` to the four corners around `pos` with bilinear weights.
    ///
    /// The weights sum to one, so the four corners gain exactly `amount`.
    pub fn splat(&mut self, pos: Vec2, amount: f32) {
        let c = self.cell(pos);

        let down = (1.0 - c.v) * amount;
        let up = c.v * amount;

        self.heights[c.i00] += (1.0 - c.u) * down;
        self.heights[c.i10] += c.u * down;
        self.heights[c.i01] += (1.0 - c.u) * up;
        self.heights[c.i11] += c.u * up;
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(size: usize) -> HeightGrid {
        // h(x, y) = x + 2y, which bilinear interpolation reproduces exactly.
        let heights = (0..size * size)
            .map(|i| (i % size) as f32 + 2.0 * (i / size) as f32)
            .collect();
        HeightGrid::from_heights(size, size, heights).unwrap()
    }

    #[test]
    fn test_rejects_tiny_grids() {
        assert_eq!(HeightGrid::new(1, 5), Err(GridError::TooSmall { width: 1, height: 5 }));
        assert!(HeightGrid::square(2).is_ok());
    }

    #[test]
    fn test_from_heights_length_mismatch() {
        let err = HeightGrid::from_heights(3, 3, vec![0.0; 8]).unwrap_err();
        assert_eq!(err, GridError::LengthMismatch { expected: 9, actual: 8 });
    }

    #[test]
    fn test_get_set_row_major() {
        let mut grid = HeightGrid::new(4, 3).unwrap();
        grid.set(3, 1, 2.5);
        assert_eq!(grid.get(3, 1), 2.5);
        assert_eq!(grid.heights()[7], 2.5);
        assert_eq!(grid.dimensions(), (4, 3));
        assert!(!grid.is_square());
    }

    #[test]
    fn test_sample_matches_cells_and_interpolates() {
        let grid = ramp(5);
        assert_eq!(grid.sample(Vec2::new(2.0, 3.0)), 8.0);
        assert!((grid.sample(Vec2::new(1.5, 0.25)) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_on_far_edge() {
        let grid = ramp(4);
        assert_eq!(grid.sample(Vec2::new(3.0, 3.0)), 9.0);
        assert!((grid.sample(Vec2::new(3.0, 1.5)) - 6.0).abs() < 1e-6);
        assert!((grid.sample(Vec2::new(0.5, 3.0)) - 6.5).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_direction() {
        let grid = ramp(5);
        let g = grid.gradient(Vec2::new(1.3, 2.6));
        let expected = Vec2::new(1.0, 2.0).normalize();
        assert!((g - expected).length() < 1e-5);

        // Still defined on the far edge.
        let g_edge = grid.gradient(Vec2::new(4.0, 4.0));
        assert!((g_edge - expected).length() < 1e-5);
    }

    #[test]
    fn test_gradient_flat_is_zero() {
        let grid = HeightGrid::square(4).unwrap();
        assert_eq!(grid.gradient(Vec2::new(1.5, 1.5)), Vec2::ZERO);
    }

    #[test]
    fn test_splat_conserves_amount() {
        let mut grid = HeightGrid::square(5).unwrap();
        grid.splat(Vec2::new(1.25, 2.75), 0.8);

        let corners = grid.get(1, 2) + grid.get(2, 2) + grid.get(1, 3) + grid.get(2, 3);
        assert!((corners - 0.8).abs() < 1e-6);
        assert!((grid.total() - 0.8).abs() < 1e-6);
        assert!((grid.get(1, 2) - 0.75 * 0.25 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_splat_then_sample_recovers_amount_at_cell() {
        let mut grid = HeightGrid::square(4).unwrap();
        grid.splat(Vec2::new(2.0, 1.0), 0.5);
        assert!((grid.sample(Vec2::new(2.0, 1.0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_splat_on_far_edge() {
        let mut grid = HeightGrid::square(4).unwrap();
        grid.splat(Vec2::new(3.0, 3.0), 1.0);
        assert!((grid.get(3, 3) - 1.0).abs() < 1e-6);
        assert!((grid.total() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_range() {
        let mut grid = HeightGrid::from_heights(2, 2, vec![-3.0, 1.0, 5.0, 0.0]).unwrap();
        grid.normalize();
        assert_eq!(grid.height_range(), (0.0, 1.0));
        assert_eq!(grid.get(1, 0), 0.5);
    }

    #[test]
    fn test_normalize_degenerate_is_zero() {
        let mut grid = HeightGrid::from_heights(2, 2, vec![0.7; 4]).unwrap();
        grid.normalize();
        assert!(grid.heights().iter().all(|&h| h == 0.0));
    }
}
