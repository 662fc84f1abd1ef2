use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::pipeline::ExtractionPipeline;

/// Build the HTTP router around a shared pipeline.
pub fn extraction_router(pipeline: Arc<ExtractionPipeline>, max_upload_bytes: usize) -> Router {
    let ctx = ApiContext::new(pipeline, max_upload_bytes);

    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/v1/extract", post(endpoints::extract::extract))
        .route("/v1/extract/", post(endpoints::extract::extract))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
