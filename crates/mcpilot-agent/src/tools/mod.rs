//! Tool modules for the mcpilot agent.

pub mod base;
pub mod mcp;
pub mod registry;

pub use base::Tool;
pub use mcp::{register_server_tools, McpTool};
pub use registry::ToolRegistry;
