// SPDX-License-Identifier: MIT

//! YAML pipeline scripts that drive Warp and Unwarp steps

pub mod loader;
pub mod runner;
pub mod types;

pub use loader::PipelineLoader;
pub use runner::{PipelineReport, PipelineRunner, StepReport};
pub use types::{PipelineDef, StepDef};
