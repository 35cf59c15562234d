//! # LLM Provider Interface
//!
//! A trait-based abstraction for talking to a chat-completion backend.
//!
//! ## Design
//! - `LlmProvider` defines the one capability the assistant needs:
//!   messages + max tokens + temperature in, trimmed reply text out
//! - `OpenAIProvider` speaks the OpenAI-compatible HTTP API (DeepInfra,
//!   OpenRouter, OpenAI, Ollama, ...)
//! - One attempt per call; failures come back as `ModelError`

pub mod openai;

pub use openai::OpenAIProvider;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub model: String,
    /// Reply text, already trimmed of surrounding whitespace
    pub content: String,
    pub usage: Usage,
}

impl CompletionResponse {
    /// Response carrying only text; providers without usage data and test doubles use this
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            content: content.into().trim().to_string(),
            usage: Usage::default(),
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Errors
// ============================================================================

/// Why a model call produced no reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Network failure, timeout, or a non-success HTTP status
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// Success status, but the reply field was missing or unreadable
    MalformedResponse(String),
}

impl ModelError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Text shown to the user in place of the model's reply
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => format!("Error communicating with the model API: {}", self),
            Self::MalformedResponse(_) => {
                format!("Error: no valid response from the model ({})", self)
            }
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { status: Some(code), message } => {
                write!(f, "HTTP {}: {}", code, message)
            }
            Self::Transport { status: None, message } => write!(f, "{}", message),
            Self::MalformedResponse(detail) => write!(f, "malformed response: {}", detail),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<ModelError> for termai_error::Error {
    fn from(err: ModelError) -> Self {
        let kind = match &err {
            ModelError::Transport { .. } => termai_error::ErrorKind::ModelTransport,
            ModelError::MalformedResponse(_) => termai_error::ErrorKind::MalformedResponse,
        };
        termai_error::Error::new(kind, err.to_string())
            .with_operation("provider::complete")
            .set_source(err)
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// The model capability the assistant depends on
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai")
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    /// Send a completion request and get the full, trimmed reply
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError>;

    /// `complete(messages, max_tokens, temperature) -> text`
    async fn reply(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: usize,
        temperature: f32,
    ) -> Result<String, ModelError> {
        let request = CompletionRequest::new(messages)
            .with_max_tokens(max_tokens)
            .with_temperature(temperature);
        let response = self.complete(request).await?;
        Ok(response.content)
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn deepinfra(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: "https://api.deepinfra.com/v1/openai".into(),
            default_model: "deepseek-ai/DeepSeek-V3-0324".into(),
            headers: HashMap::new(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
