//! Terrain data module.
//!
//! Provides the `HeightGrid` scalar field and its noise population.

mod grid;
mod heightmap;

pub use grid::{GridError, HeightGrid};
pub use heightmap::populate_map;
