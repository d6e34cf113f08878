//! Conversation loop — one user query through the model and its tools.
//!
//! A turn is at most two chat requests: the first carries the tool manifest,
//! the tool results are appended, and the second produces the final answer.
//! The turn works on a copy of the caller's history and hands back the new
//! history only when it completes, so a failed turn leaves nothing behind.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use mcpilot_core::types::{LlmResponse, Message, ToolCall, ToolDefinition};
use mcpilot_providers::{LlmProvider, LlmRequestConfig};

use crate::context::seed_history;
use crate::error::TurnError;
use crate::tools::ToolRegistry;

// ─────────────────────────────────────────────
// Turn state
// ─────────────────────────────────────────────

/// Where a turn is between chat requests.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnState {
    /// First request, with the manifest, not yet answered.
    AwaitingFirstResponse,
    /// Tool results appended; waiting for the model's final answer.
    AwaitingFinalResponse,
    /// Final text produced.
    Done(String),
}

/// Result of a completed turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    /// Text shown to the user.
    pub reply: String,
    /// The caller's history plus everything this turn appended.
    pub history: Vec<Message>,
}

// ─────────────────────────────────────────────
// ConversationLoop
// ─────────────────────────────────────────────

/// Drives turns against one provider, model, and tool set.
pub struct ConversationLoop {
    /// LLM provider.
    provider: Arc<dyn LlmProvider>,
    /// Registered tools.
    tools: ToolRegistry,
    /// Model identifier sent with every request.
    model: String,
    /// System prompt template containing `{tools}`.
    system_prompt: String,
    /// Temperature and max_tokens.
    request_config: LlmRequestConfig,
}

impl ConversationLoop {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let model = model.into();
        info!(
            provider = provider.display_name(),
            model = %model,
            tools = tools.len(),
            "conversation loop initialized"
        );
        Self {
            provider,
            tools,
            model,
            system_prompt: system_prompt.into(),
            request_config: LlmRequestConfig::deterministic(),
        }
    }

    /// Run one turn for `query`.
    ///
    /// An empty `history` is seeded with the rendered system prompt; a
    /// non-empty one is extended as-is.
    pub async fn run_turn(&self, query: &str, history: &[Message]) -> Result<TurnOutcome, TurnError> {
        let mut messages = if history.is_empty() {
            seed_history(&self.system_prompt, &self.tools)
        } else {
            history.to_vec()
        };
        messages.push(Message::user(query));

        let mut state = TurnState::AwaitingFirstResponse;
        loop {
            state = match state {
                TurnState::AwaitingFirstResponse => {
                    let definitions = self.tools.get_definitions();
                    let manifest = (!definitions.is_empty()).then_some(definitions.as_slice());
                    let response = self.request(&messages, manifest).await?;

                    if response.has_tool_calls() {
                        self.run_tool_calls(&mut messages, response).await?;
                        TurnState::AwaitingFinalResponse
                    } else {
                        TurnState::Done(response.content.unwrap_or_default())
                    }
                }
                TurnState::AwaitingFinalResponse => {
                    let response = self.request(&messages, None).await?;
                    if response.has_tool_calls() {
                        warn!(
                            count = response.tool_calls.len(),
                            "ignoring tool calls in final response"
                        );
                    }
                    TurnState::Done(response.content.unwrap_or_default())
                }
                TurnState::Done(reply) => {
                    messages.push(Message::assistant(reply.clone()));
                    return Ok(TurnOutcome {
                        reply,
                        history: messages,
                    });
                }
            };
        }
    }

    /// Invoke every requested tool in order, then append the assistant
    /// message and one tool message per call.
    async fn run_tool_calls(&self, messages: &mut Vec<Message>, response: LlmResponse) -> Result<(), TurnError> {
        let mut results = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            let params = parse_arguments(call)?;
            info!(tool = %call.function.name, id = %call.id, "executing tool call");
            let output = self.tools.execute(&call.function.name, params).await?;
            results.push(Message::tool_result(&call.id, &call.function.name, output));
        }

        messages.push(Message::assistant_tool_calls(response.content, response.tool_calls));
        messages.extend(results);
        Ok(())
    }

    async fn request(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse, TurnError> {
        debug!(messages = messages.len(), with_tools = tools.is_some(), "chat request");
        let response = self
            .provider
            .chat(messages, tools, &self.model, &self.request_config)
            .await?;
        Ok(response)
    }
}

/// Decode a call's `arguments` string, which must be a JSON object.
fn parse_arguments(call: &ToolCall) -> Result<HashMap<String, Value>, TurnError> {
    serde_json::from_str(&call.function.arguments).map_err(|source| TurnError::MalformedArguments {
        tool: call.function.name.clone(),
        source,
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
