//! mcpilot core — types shared by every crate in the workspace.
//!
//! - **types**: conversation messages, tool calls, and chat-completion wire types
//! - **config**: the JSON config schema and its loader
//! - **utils**: data-directory helpers

pub mod config;
pub mod types;
pub mod utils;

pub use config::{Config, ConfigError, McpServerConfig};
pub use types::{LlmResponse, Message, ToolCall, ToolDefinition};
