//! mcpilot agent — tool registry, MCP tool adapter, and the conversation turn.
//!
//! This crate contains:
//! - **tools**: Tool trait, ordered registry, and the MCP-backed tool
//! - **context**: System prompt rendering
//! - **agent_loop**: One user query → model → tools → model turn

pub mod agent_loop;
pub mod context;
pub mod error;
pub mod tools;

pub use agent_loop::{ConversationLoop, TurnOutcome, TurnState};
pub use error::TurnError;
pub use tools::{McpTool, Tool, ToolRegistry};
