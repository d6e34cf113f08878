use mcpilot_providers::ProviderError;
use thiserror::Error;

/// Anything that aborts a conversation turn. The caller's history is left
/// as it was before the turn started.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("chat-completion request failed: {0}")]
    ModelApi(#[from] ProviderError),

    #[error("model requested unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("arguments for tool '{tool}' are not a JSON object: {source}")]
    MalformedArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tool '{tool}' failed: {source}")]
    ToolInvocation {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}
