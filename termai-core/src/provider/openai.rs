//! OpenAI-compatible provider implementation
//!
//! Works with DeepInfra, OpenRouter, OpenAI, Ollama, and other endpoints
//! that accept `POST {base_url}/chat/completions`.

use super::*;
use crate::error;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    /// Build the HTTP client; every request is bounded by `config.timeout_secs`
    pub fn new(config: ProviderConfig) -> termai_error::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| error::client_build_failed(e.to_string()).set_source(e))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        let api_request = OpenAIRequest {
            model: self.default_model(),
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(
            model = api_request.model,
            messages = request.messages.len(),
            "sending completion request"
        );

        let mut req = self.client.post(self.endpoint()).json(&api_request);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.bearer_auth(api_key);
            }
        }

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req.send().await.map_err(|e| ModelError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::status(status.as_u16(), text));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        parse_completion(&body)
    }
}

/// Pull `choices[0].message.content` (and usage, when present) out of a
/// success body
pub(crate) fn parse_completion(body: &serde_json::Value) -> Result<CompletionResponse, ModelError> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ModelError::MalformedResponse("missing choices[0].message.content".into())
        })?;

    let usage = body
        .get("usage")
        .map(|u| {
            let field = |name: &str| u.get(name).and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            Usage {
                prompt_tokens: field("prompt_tokens"),
                completion_tokens: field("completion_tokens"),
                total_tokens: field("total_tokens"),
            }
        })
        .unwrap_or_default();

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    debug!(model = %model, total_tokens = usage.total_tokens, "completion received");

    Ok(CompletionResponse {
        model,
        content: content.trim().to_string(),
        usage,
    })
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}
