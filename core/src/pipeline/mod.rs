// core/src/pipeline/mod.rs

//! A small async step pipeline: named steps, per-step handlers operating on
//! shared [`ContextData`], optional steps and skip conditions. Checkout is
//! expressed as one of these.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};
