//! HTTP server lifecycle.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::api::router::extraction_router;
use crate::pipeline::ExtractionPipeline;

/// Bind `bind_addr` and serve until Ctrl-C.
pub async fn serve(
    bind_addr: &str,
    pipeline: Arc<ExtractionPipeline>,
    max_upload_bytes: usize,
) -> Result<(), String> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("Failed to bind {bind_addr}: {e}"))?;

    let app = extraction_router(pipeline, max_upload_bytes);
    serve_with_shutdown(listener, app, shutdown_signal()).await
}

/// Serve `app` on an already-bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to read local address: {e}"))?;
    tracing::info!(%addr, "Extraction API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| format!("Server error: {e}"))?;

    tracing::info!("Extraction API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
