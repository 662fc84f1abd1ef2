use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use lease_extract::config::{self, Settings};
use lease_extract::{api, init_tracing, ExtractionPipeline};

fn main() -> ExitCode {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env_and_file(Path::new(".env"));

    // Built outside the runtime: the blocking HTTP client owns its own runtime.
    let pipeline = match ExtractionPipeline::production(&settings) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build extraction pipeline");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(api::serve(
        &settings.bind_addr,
        pipeline.clone(),
        settings.max_upload_bytes(),
    ));
    drop(runtime);
    drop(pipeline);

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server exited with error");
            ExitCode::FAILURE
        }
    }
}
