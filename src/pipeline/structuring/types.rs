use super::StructuringError;

/// LLM client abstraction (allows mocking for tests)
pub trait LlmClient {
    /// Send a prompt to the model and get the raw text reply.
    fn generate(&self, model: &str, prompt: &str, system: &str)
        -> Result<String, StructuringError>;
}
