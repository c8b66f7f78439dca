//! Client for the language-model completion service.
//!
//! Requests go straight to an OpenAI-compatible `chat/completions` endpoint over HTTP. The
//! request shape (single user message, fixed token budget and temperature) is the contract the
//! summary cache was built against, so changing it changes what cached summaries mean.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on generated tokens per summary.
pub const MAX_OUTPUT_TOKENS: u32 = 5000;
/// Sampling temperature sent with every request.
pub const TEMPERATURE: f64 = 0.7;

/// Errors surfaced while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Service could not be reached or the client could not be built.
    #[error("Completion service unavailable: {0}")]
    ProviderUnavailable(String),
    /// Service answered with a non-success status.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Service response could not be decoded or carried no content.
    #[error("Malformed completion response: {0}")]
    InvalidResponse(String),
    /// Call exceeded the configured deadline.
    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),
}

/// Request payload passed to the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier understood by the service.
    pub model: String,
    /// Fully rendered prompt.
    pub prompt: String,
    /// Maximum number of generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl CompletionRequest {
    /// Build a request using the fixed token budget and temperature.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

/// Interface implemented by completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate text for the rendered prompt.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Client for OpenAI's chat-completions API (or any compatible server).
pub struct OpenAiCompletionClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompletionClient {
    /// Construct a client for `base_url` authenticated with `api_key`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .user_agent(concat!("summarist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                CompletionError::ProviderUnavailable(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let payload = json!({
            "model": request.model,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                CompletionError::ProviderUnavailable(format!(
                    "failed to reach completion service at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CompletionError::ProviderUnavailable(format!(
                "endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::GenerationFailed(format!(
                "service returned {status}: {body}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            CompletionError::InvalidResponse(format!("failed to decode response: {error}"))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                CompletionError::InvalidResponse("response carried no content".into())
            })?;

        Ok(content)
    }
}
