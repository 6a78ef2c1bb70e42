//! Reasoning service contract and an OpenAI-compatible chat client
//!
//! The default endpoint is a local LM Studio server; any server speaking the
//! `/chat/completions` protocol works.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Client initialization failed: {0}")]
    InitializationError(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Response contained no message content")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Structured prompt sent to the reasoning service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningRequest {
    pub system: String,
    pub prompt: String,
}

/// External text generator used by the consistency analyzer
///
/// Implementations must return within their configured timeout.
pub trait ReasoningService: Send + Sync {
    /// Raw response text for `request`
    fn complete(&self, request: &ReasoningRequest) -> Result<String, ReasoningError>;

    fn model_name(&self) -> &str;
}

/// Connection settings for `ChatCompletionsClient`
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Base URL, e.g. `http://localhost:1234/v1`
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            model: "qwen2.5-vl-7b".to_string(),
            api_key: None,
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionsClient {
    http: reqwest::blocking::Client,
    config: ChatClientConfig,
    endpoint: String,
}

impl ChatCompletionsClient {
    pub fn new(config: ChatClientConfig) -> Result<Self, ReasoningError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReasoningError::InitializationError(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            config,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn extract_content(response: ChatResponse) -> Result<String, ReasoningError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ReasoningError::EmptyResponse)
    }
}

impl ReasoningService for ChatCompletionsClient {
    fn complete(&self, request: &ReasoningRequest) -> Result<String, ReasoningError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        // LM Studio ignores the key but OpenAI-compatible servers expect the header
        let api_key = self.config.api_key.as_deref().unwrap_or("lm-studio");

        tracing::debug!("POST {} (model {})", self.endpoint, self.config.model);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout(self.config.timeout)
                } else {
                    ReasoningError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReasoningError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ReasoningError::MalformedResponse(e.to_string()))?;

        Self::extract_content(parsed)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
