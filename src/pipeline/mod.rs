//! Pipeline module for orchestrating terrain generation stages.
//!
//! Provides a trait-based architecture for stages that can be composed
//! into a complete noise-then-erosion run.

mod stage;

pub use stage::{
    GenerationStage, StageId, StageConfig, Pipeline, PipelineError,
    HeightmapStage, ErosionStage,
};
