//! LLM Provider trait — the seam between the conversation loop and the model API.
//!
//! `HttpProvider` covers every OpenAI-compatible API; tests plug in mocks.

use async_trait::async_trait;
use mcpilot_core::types::{LlmResponse, Message, ToolDefinition};

use crate::error::ProviderError;

/// Sampling parameters passed with each chat request.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl LlmRequestConfig {
    /// Temperature 0 and a 4096-token cap, used for every turn so prompts
    /// are reproducible.
    pub fn deterministic() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.0,
        }
    }
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self::deterministic()
    }
}

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` — Full conversation history, replayed verbatim.
    /// * `tools`    — Tool manifest; `None` leaves `tools` out of the request.
    /// * `model`    — Model identifier (e.g. `"gpt-4o-mini"`).
    /// * `config`   — Temperature, max_tokens.
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ProviderError>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
