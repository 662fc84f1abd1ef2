pub mod extraction;
pub mod patterns;
pub mod structuring;
pub mod reconcile;
pub mod processor;

pub use processor::{ExtractionPipeline, PipelineState};
