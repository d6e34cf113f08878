//! HTTP LLM provider for OpenAI-compatible APIs.
//!
//! Talks directly to `<base_url>/chat/completions` with a Bearer key. Any
//! backend that speaks that dialect works: OpenAI, OpenRouter, DeepSeek,
//! Groq, vLLM, Ollama's OpenAI endpoint, and so on.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use mcpilot_core::config::Config;
use mcpilot_core::types::{ChatCompletionRequest, ChatCompletionResponse, LlmResponse, Message, ToolDefinition};

use crate::error::ProviderError;
use crate::traits::{LlmProvider, LlmRequestConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A chat-completion client for any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider for `api_base` authenticated with `api_key`.
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(HttpProvider {
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from the `base_url` / `api_key` fields of the loaded config.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Self::new(&config.base_url, &config.api_key)
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ProviderError> {
        debug!(
            model = %model,
            messages = messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Calling LLM"
        );

        let request_body = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
            tool_choice: tools.map(|_| "auto".to_string()),
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ProviderError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %body, "API error");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat_resp: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse LLM response");
            ProviderError::Decode(e.to_string())
        })?;

        let llm_resp = chat_resp.into_first_choice().ok_or(ProviderError::NoChoices)?;
        debug!(
            has_content = llm_resp.content.is_some(),
            tool_calls = llm_resp.tool_calls.len(),
            finish_reason = llm_resp.finish_reason.as_deref().unwrap_or("?"),
            "LLM response received"
        );
        Ok(llm_resp)
    }

    fn display_name(&self) -> &str {
        "OpenAI-compatible"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
