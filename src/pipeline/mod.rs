//! The render pipeline: request model, progress tracking, per-render
//! scratch space and the stage orchestrator.

pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod scratch;
