pub mod api;
pub mod config;
pub mod models;
pub mod pipeline;

pub use models::{ExtractionResult, FieldCandidate, TargetField};
pub use pipeline::{ExtractionPipeline, PipelineState};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
