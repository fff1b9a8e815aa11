//! Generation stage trait and pipeline orchestration.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::info;

use crate::erosion::{ConfigError, ErosionConfig, ErosionEngine, ErosionError, ErosionStats};
use crate::noise::NoiseConfig;
use crate::terrain::{populate_map, GridError, HeightGrid};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Initial heightmap generation from noise.
    Heightmap,
    /// Droplet erosion.
    Erosion,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Heightmap => "heightmap",
            StageId::Erosion => "erosion",
        }
    }
}

/// Configuration passed to each generation stage.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    /// Noise configuration for terrain generation.
    pub noise: NoiseConfig,
}

impl StageConfig {
    /// Creates a new configuration with the given noise settings.
    pub fn with_noise(noise: NoiseConfig) -> Self {
        Self { noise }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Erosion(#[from] ErosionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Trait for implementing generation stages.
///
/// Each stage transforms the height grid in some way, building upon
/// previous stages.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the generation stage, modifying the grid in place.
    fn execute(&self, grid: &mut HeightGrid, config: &StageConfig) -> Result<(), PipelineError>;
}

/// Orchestrates multiple generation stages into a complete pipeline.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    config: StageConfig,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: StageConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all stages in order on the given grid.
    pub fn run(&self, grid: &mut HeightGrid) -> Result<(), PipelineError> {
        self.run_with_callbacks(grid, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `grid` - The grid to generate into
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        grid: &mut HeightGrid,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            stage.execute(grid, &self.config)?;
            completed.push(stage.id());
            info!(stage = stage.name(), "stage complete");

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Heightmap generation stage using fractal noise.
///
/// Replaces the grid contents, keeping its dimensions.
pub struct HeightmapStage;

impl GenerationStage for HeightmapStage {
    fn id(&self) -> StageId {
        StageId::Heightmap
    }

    fn name(&self) -> &str {
        "Heightmap Generation"
    }

    fn execute(&self, grid: &mut HeightGrid, config: &StageConfig) -> Result<(), PipelineError> {
        let (width, height) = grid.dimensions();
        *grid = populate_map(width, height, &config.noise)?;
        Ok(())
    }
}

/// Droplet erosion stage.
///
/// Runs `drops` droplets in frames of `drops_per_frame`, the way an
/// interactive caller would spread the work over several frames.
pub struct ErosionStage {
    pub config: ErosionConfig,
    /// Total droplets to simulate.
    pub drops: u32,
    /// Droplets per frame; 0 runs everything in one frame.
    pub drops_per_frame: u32,
    /// Seed for droplet spawn positions.
    pub seed: u64,
}

impl ErosionStage {
    /// Creates a new erosion stage with the given configuration.
    pub fn new(config: ErosionConfig, drops: u32, seed: u64) -> Self {
        Self {
            config,
            drops,
            drops_per_frame: 0,
            seed,
        }
    }

    pub fn with_drops_per_frame(mut self, drops_per_frame: u32) -> Self {
        self.drops_per_frame = drops_per_frame;
        self
    }

    /// Runs the stage and returns the accumulated statistics.
    pub fn run(&self, grid: &mut HeightGrid) -> Result<ErosionStats, PipelineError> {
        let engine = ErosionEngine::new(self.config.clone())?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let frame = if self.drops_per_frame == 0 {
            self.drops.max(1)
        } else {
            self.drops_per_frame
        };

        let mut stats = ErosionStats::default();
        let mut remaining = self.drops;
        let mut frames = 0u32;
        while remaining > 0 {
            let batch = remaining.min(frame);
            let frame_stats = engine.simulate_drops(grid, batch, &mut rng)?;
            stats.merge(&frame_stats);
            remaining -= batch;
            frames += 1;
        }

        info!(
            drops = stats.drops,
            frames,
            mean_steps = stats.mean_steps(),
            "erosion finished"
        );
        Ok(stats)
    }
}

impl GenerationStage for ErosionStage {
    fn id(&self) -> StageId {
        StageId::Erosion
    }

    fn name(&self) -> &str {
        "Droplet Erosion"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Heightmap]
    }

    fn execute(&self, grid: &mut HeightGrid, _config: &StageConfig) -> Result<(), PipelineError> {
        self.run(grid).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heightmap_stage_uses_stage_noise() {
        let noise = NoiseConfig::rugged(19);
        let mut pipeline = Pipeline::new(StageConfig::with_noise(noise.clone()));
        pipeline.add_stage(HeightmapStage);

        let mut grid = HeightGrid::new(20, 12).unwrap();
        pipeline.run(&mut grid).unwrap();

        assert_eq!(grid, populate_map(20, 12, &noise).unwrap());
    }

    #[test]
    fn test_pipeline_execution() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(HeightmapStage);

        let mut grid = HeightGrid::square(32).unwrap();
        pipeline.run(&mut grid).unwrap();

        let (min, max) = grid.height_range();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_pipeline_with_erosion_changes_grid() {
        let mut pipeline = Pipeline::new(StageConfig::with_noise(NoiseConfig::with_seed(77)));
        pipeline.add_stage(HeightmapStage);
        pipeline.add_stage(ErosionStage::new(ErosionConfig::channels(), 400, 5).with_drops_per_frame(64));
        assert_eq!(pipeline.stage_count(), 2);

        let mut eroded = HeightGrid::square(32).unwrap();
        pipeline.run(&mut eroded).unwrap();

        let pristine = populate_map(32, 32, &NoiseConfig::with_seed(77)).unwrap();
        assert_ne!(eroded, pristine);
    }

    #[test]
    fn test_erosion_stage_frames_are_equivalent() {
        let base = populate_map(24, 24, &NoiseConfig::with_seed(3)).unwrap();

        let mut framed = base.clone();
        let framed_stats = ErosionStage::new(ErosionConfig::default(), 250, 9)
            .with_drops_per_frame(32)
            .run(&mut framed)
            .unwrap();

        let mut single = base.clone();
        let single_stats = ErosionStage::new(ErosionConfig::default(), 250, 9)
            .run(&mut single)
            .unwrap();

        assert_eq!(framed, single);
        assert_eq!(framed_stats.drops, 250);
        assert_eq!(single_stats.drops, 250);
    }

    #[test]
    fn test_zero_drops_leaves_grid_alone() {
        let mut grid = populate_map(16, 16, &NoiseConfig::default()).unwrap();
        let before = grid.clone();
        let stats = ErosionStage::new(ErosionConfig::default(), 0, 1).run(&mut grid).unwrap();
        assert_eq!(stats.drops, 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_missing_dependency() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(ErosionStage::new(ErosionConfig::default(), 10, 1));

        let mut grid = HeightGrid::square(16).unwrap();
        let err = pipeline.run(&mut grid).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDependency(_, _)));
    }

    #[test]
    fn test_invalid_erosion_config_fails_stage() {
        let config = ErosionConfig {
            inertia: 2.0,
            ..Default::default()
        };
        let mut grid = HeightGrid::square(16).unwrap();
        let err = ErosionStage::new(config, 10, 1).run(&mut grid).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_non_square_grid_fails_erosion() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(HeightmapStage);
        pipeline.add_stage(ErosionStage::new(ErosionConfig::default(), 10, 1));

        let mut grid = HeightGrid::new(32, 16).unwrap();
        let err = pipeline.run(&mut grid).unwrap_err();
        assert!(matches!(err, PipelineError::Erosion(ErosionError::NotSquare { .. })));
    }

    #[test]
    fn test_pipeline_with_callbacks() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(HeightmapStage);

        let mut grid = HeightGrid::square(16).unwrap();
        let mut started = false;
        let mut completed = false;

        pipeline
            .run_with_callbacks(
                &mut grid,
                |name, _, _| {
                    assert_eq!(name, "Heightmap Generation");
                    started = true;
                },
                |name, _, _| {
                    assert_eq!(name, "Heightmap Generation");
                    completed = true;
                },
            )
            .unwrap();

        assert!(started);
        assert!(completed);
    }
}
