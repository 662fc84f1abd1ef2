use std::sync::Arc;

use super::parser::{normalize_candidates, parse_model_reply};
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::types::LlmClient;
use crate::models::CandidateSet;

/// Model Extractor adapter: prompt in, normalized candidates out.
///
/// Failures of the inference call or of reply parsing are logged and yield
/// an empty set; they never fail the run.
pub struct ModelExtractor {
    llm: Arc<dyn LlmClient + Send + Sync>,
    model_name: String,
}

impl ModelExtractor {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, model_name: &str) -> Self {
        Self {
            llm,
            model_name: model_name.to_string(),
        }
    }

    pub fn extract(&self, raw_text: &str, document_type: &str) -> CandidateSet {
        let prompt = build_extraction_prompt(raw_text, document_type);

        let reply = match self
            .llm
            .generate(&self.model_name, &prompt, EXTRACTION_SYSTEM_PROMPT)
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(model = %self.model_name, error = %e, "Model extraction call failed");
                return CandidateSet::new();
            }
        };

        match parse_model_reply(&reply) {
            Ok(object) => {
                let candidates = normalize_candidates(&object);
                tracing::debug!(
                    model = %self.model_name,
                    candidates = candidates.len(),
                    "Model reply normalized"
                );
                candidates
            }
            Err(e) => {
                tracing::warn!(
                    model = %self.model_name,
                    error = %e,
                    reply_length = reply.len(),
                    "Model reply could not be parsed"
                );
                CandidateSet::new()
            }
        }
    }
}
