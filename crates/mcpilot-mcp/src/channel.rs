//! Newline-delimited JSON-RPC 2.0 over a pair of async streams.
//!
//! The channel has at most one request in flight. While waiting for the
//! matching response it skips noise, logs notifications, and answers the
//! few server-initiated requests a client must handle.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::McpError;
use crate::protocol::{METHOD_NOT_FOUND, METHOD_PING};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Request/response framing for one server connection.
pub struct RpcChannel {
    server: String,
    reader: BufReader<BoxedReader>,
    writer: BoxedWriter,
    next_id: u64,
}

impl RpcChannel {
    pub fn new(server: impl Into<String>, reader: BoxedReader, writer: BoxedWriter) -> Self {
        Self {
            server: server.into(),
            reader: BufReader::new(reader),
            writer,
            next_id: 1,
        }
    }

    /// Send a request and wait for its `result`.
    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id;
        self.next_id += 1;

        debug!(server = %self.server, id, method, "sending request");
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        loop {
            let message = self.read_message().await?;

            if message.get("method").is_some() {
                self.handle_server_message(message).await?;
                continue;
            }

            match message.get("id").and_then(response_id) {
                Some(got) if got == id => return self.take_result(message),
                other => {
                    debug!(server = %self.server, expected = id, got = ?other, "ignoring unmatched response");
                }
            }
        }
    }

    /// Send a notification (no id, no response).
    pub async fn notify(&mut self, method: &str, params: Value) -> Result<(), McpError> {
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        }))
        .await
    }

    fn take_result(&self, mut message: Value) -> Result<Value, McpError> {
        if let Some(error) = message.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
            let text = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(McpError::Rpc {
                server: self.server.clone(),
                code,
                message: text,
            });
        }
        Ok(message
            .get_mut("result")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Notifications and server-initiated requests that arrive mid-call.
    async fn handle_server_message(&mut self, message: Value) -> Result<(), McpError> {
        let method = message
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let Some(id) = message.get("id").cloned() else {
            debug!(server = %self.server, method = %method, "received notification");
            return Ok(());
        };

        if method == METHOD_PING {
            return self
                .write_message(&json!({ "jsonrpc": "2.0", "id": id, "result": {} }))
                .await;
        }

        warn!(server = %self.server, method = %method, "server sent unsupported request");
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": METHOD_NOT_FOUND,
                "message": format!("client does not implement method '{method}'"),
            }
        }))
        .await
    }

    /// Next JSON value from the stream, skipping blank and non-JSON lines.
    async fn read_message(&mut self) -> Result<Value, McpError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| self.transport_error(e.to_string()))?;
            if read == 0 {
                return Err(McpError::Closed {
                    server: self.server.clone(),
                });
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) if value.is_object() => return Ok(value),
                Ok(_) | Err(_) => {
                    warn!(server = %self.server, line = trimmed, "skipping non JSON-RPC line from MCP server");
                }
            }
        }
    }

    async fn write_message(&mut self, message: &Value) -> Result<(), McpError> {
        let mut encoded = message.to_string();
        encoded.push('\n');
        self.writer
            .write_all(encoded.as_bytes())
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| self.transport_error(e.to_string()))
    }

    fn transport_error(&self, message: String) -> McpError {
        McpError::Transport {
            server: self.server.clone(),
            message,
        }
    }
}

/// Response ids come back as numbers, but some servers echo them as strings.
fn response_id(id: &Value) -> Option<u64> {
    match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
