use thiserror::Error;

/// Failures talking to one MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// Spawn or handshake failed; the server contributes no tools.
    #[error("failed to connect to MCP server '{server}': {message}")]
    Connection { server: String, message: String },

    #[error("MCP server '{server}' is already connected")]
    AlreadyConnected { server: String },

    #[error("MCP server '{server}' is not connected")]
    NotConnected { server: String },

    #[error("MCP server '{server}' transport error: {message}")]
    Transport { server: String, message: String },

    #[error("MCP server '{server}' closed the connection")]
    Closed { server: String },

    #[error("MCP server '{server}' sent a malformed reply: {message}")]
    Protocol { server: String, message: String },

    #[error("MCP server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },

    /// The server ran the tool and flagged the result with `isError`.
    #[error("tool '{tool}' on MCP server '{server}' reported an error: {message}")]
    ToolReported {
        server: String,
        tool: String,
        message: String,
    },

    #[error("tool '{tool}' on MCP server '{server}' failed: {message}")]
    Invocation {
        server: String,
        tool: String,
        message: String,
    },
}
