//! Develop orchestration module
//!
//! Wires the stages together behind reader/writer seams and collects
//! per-stage timings.

pub mod pipeline;
pub mod timing;


pub use pipeline::{RenderConfig, RenderConfigBuilder, RenderPipeline};
pub use timing::{PipelineTimings, StageTiming};
