use std::sync::Arc;

use crate::pipeline::ExtractionPipeline;

/// Document label used when the request names none.
pub const DEFAULT_DOCUMENT_TYPE: &str = "kira_sozlesmesi";

/// Shared state for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<ExtractionPipeline>,
    pub max_upload_bytes: usize,
}

impl ApiContext {
    pub fn new(pipeline: Arc<ExtractionPipeline>, max_upload_bytes: usize) -> Self {
        Self {
            pipeline,
            max_upload_bytes,
        }
    }
}
