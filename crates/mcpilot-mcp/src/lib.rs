//! MCP tool-provider client for mcpilot.
//!
//! Speaks the client half of the Model Context Protocol over a child
//! process's stdin/stdout: newline-delimited JSON-RPC 2.0.
//!
//! - [`client::McpClient`] — one connection to one tool-provider process
//! - [`channel::RpcChannel`] — request/response framing over async streams
//! - [`protocol`] — the handful of MCP payloads the client reads and writes

pub mod channel;
pub mod client;
pub mod error;
pub mod protocol;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::McpClient;
pub use error::McpError;
pub use protocol::McpToolInfo;
