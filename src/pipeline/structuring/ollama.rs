#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::StructuringError;

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StructuringError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StructuringError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    /// Default Ollama instance at localhost:11434 with a 30-second timeout.
    pub fn default_local() -> Result<Self, StructuringError> {
        Self::new("http://localhost:11434", Duration::from_secs(30))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl LlmClient for OllamaClient {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, StructuringError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    StructuringError::OllamaConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    StructuringError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    StructuringError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StructuringError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

/// Mock LLM client for testing. Returns a fixed reply or fails, and records
/// what it was asked.
#[cfg(test)]
pub struct MockLlmClient {
    response: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

#[cfg(test)]
impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl LlmClient for MockLlmClient {
    fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _system: &str,
    ) -> Result<String, StructuringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.response
            .clone()
            .ok_or_else(|| StructuringError::OllamaConnection("http://mock:11434".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn default_local_points_at_localhost() {
        let client = OllamaClient::default_local().unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn request_body_disables_streaming() {
        let body = OllamaGenerateRequest {
            model: "llama3.1:8b",
            prompt: "p",
            system: "s",
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3.1:8b");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn unreachable_server_is_an_error() {
        // Port 9 (discard) is closed on test machines
        let client = OllamaClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(client.generate("m", "p", "s").is_err());
    }

    #[test]
    fn mock_records_prompt_and_calls() {
        let mock = MockLlmClient::new("{}");
        assert_eq!(mock.generate("m", "hello", "s").unwrap(), "{}");
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.last_prompt().as_deref(), Some("hello"));
    }

    #[test]
    fn failing_mock_returns_connection_error() {
        let mock = MockLlmClient::failing();
        assert!(matches!(
            mock.generate("m", "p", "s"),
            Err(StructuringError::OllamaConnection(_))
        ));
    }
}
