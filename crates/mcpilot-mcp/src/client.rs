//! `McpClient` — owns one connection to one tool-provider process.
//!
//! Lifecycle: `new` → `connect` (spawn + handshake) → `list_tools` /
//! `call_tool` → `disconnect`. The child is spawned with `kill_on_drop`, so
//! dropping a client without `disconnect` still reaps the process.

use std::process::Stdio;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use mcpilot_core::config::McpServerConfig;

use crate::channel::RpcChannel;
use crate::error::McpError;
use crate::protocol::{
    initialize_params, CallToolResult, InitializeResult, ListToolsResult, McpToolInfo,
    METHOD_CALL_TOOL, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_LIST_TOOLS,
};

/// How long `disconnect` waits for the child to exit after stdin closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct Connection {
    channel: RpcChannel,
    /// `None` when connected over caller-supplied streams.
    child: Option<Child>,
}

/// Client for a single MCP server.
pub struct McpClient {
    config: McpServerConfig,
    conn: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("server", &self.config.name)
            .field("command", &self.config.display_command())
            .finish()
    }
}

impl McpClient {
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
        }
    }

    /// Server name from the config.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Spawn the configured command and perform the MCP handshake.
    ///
    /// Fails with `AlreadyConnected` if called twice without `disconnect`.
    pub async fn connect(&self) -> Result<(), McpError> {
        let mut guard = self.conn.lock().await;
        if guard.is_some() {
            return Err(self.already_connected());
        }

        info!(server = %self.config.name, command = %self.config.display_command(), "launching MCP server");

        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Own process group: a Ctrl-C at the prompt must not kill the servers.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            self.connection_error(format!("failed to spawn `{}`: {e}", self.config.command))
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill().await;
            return Err(self.connection_error("failed to capture server stdio".into()));
        };

        let channel = RpcChannel::new(&self.config.name, Box::new(stdout), Box::new(stdin));
        *guard = Some(self.establish(channel, Some(child)).await?);
        Ok(())
    }

    /// Perform the handshake over caller-supplied streams instead of a child process.
    pub async fn connect_with<R, W>(&self, reader: R, writer: W) -> Result<(), McpError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut guard = self.conn.lock().await;
        if guard.is_some() {
            return Err(self.already_connected());
        }
        let channel = RpcChannel::new(&self.config.name, Box::new(reader), Box::new(writer));
        *guard = Some(self.establish(channel, None).await?);
        Ok(())
    }

    async fn establish(
        &self,
        mut channel: RpcChannel,
        child: Option<Child>,
    ) -> Result<Connection, McpError> {
        match handshake(&self.config.name, &mut channel).await {
            Ok(init) => {
                let (name, version) = init
                    .server_info
                    .map(|s| (s.name, s.version))
                    .unwrap_or_default();
                info!(
                    server = %self.config.name,
                    server_name = %name,
                    server_version = %version,
                    protocol = init.protocol_version.as_deref().unwrap_or("?"),
                    "connected to MCP server"
                );
                if let Some(instructions) = init.instructions {
                    debug!(server = %self.config.name, instructions = %instructions, "server instructions");
                }
                Ok(Connection { channel, child })
            }
            Err(e) => {
                drop(channel);
                if let Some(mut child) = child {
                    let _ = child.kill().await;
                }
                Err(self.connection_error(e.to_string()))
            }
        }
    }

    /// All tools the server currently advertises, following pagination.
    pub async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| self.not_connected())?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = conn.channel.request(METHOD_LIST_TOOLS, params).await?;
            let page: ListToolsResult =
                serde_json::from_value(result).map_err(|e| self.protocol_error(e.to_string()))?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!(server = %self.config.name, count = tools.len(), "listed tools");
        Ok(tools)
    }

    /// Call `tool` and return the text of the first text content item.
    pub async fn call_tool(&self, tool: &str, arguments: Map<String, Value>) -> Result<String, McpError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| self.not_connected())?;

        debug!(server = %self.config.name, tool, "calling tool");
        let result = conn
            .channel
            .request(
                METHOD_CALL_TOOL,
                json!({ "name": tool, "arguments": Value::Object(arguments) }),
            )
            .await?;

        let result: CallToolResult =
            serde_json::from_value(result).map_err(|e| self.protocol_error(e.to_string()))?;

        if result.is_error {
            return Err(McpError::ToolReported {
                server: self.config.name.clone(),
                tool: tool.to_string(),
                message: result.first_text().unwrap_or("(no details)").to_string(),
            });
        }

        result
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| McpError::Invocation {
                server: self.config.name.clone(),
                tool: tool.to_string(),
                message: "response carried no text content".to_string(),
            })
    }

    /// Close stdin, give the child a moment to exit, then kill its process
    /// group so nothing it started outlives the session. Idempotent.
    pub async fn disconnect(&self) {
        let Some(Connection { channel, child }) = self.conn.lock().await.take() else {
            return;
        };
        drop(channel);

        if let Some(mut child) = child {
            let group = child.id();
            let exited = match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(server = %self.config.name, %status, "MCP server exited");
                    true
                }
                Ok(Err(e)) => {
                    warn!(server = %self.config.name, error = %e, "failed to wait for MCP server");
                    false
                }
                Err(_) => {
                    debug!(server = %self.config.name, "MCP server did not exit, killing");
                    false
                }
            };

            // Background processes the server started share its group.
            kill_process_group(&self.config.name, group);
            if !exited {
                if let Err(e) = child.kill().await {
                    debug!(server = %self.config.name, error = %e, "failed to kill MCP server (may have already exited)");
                }
            }
        }
        info!(server = %self.config.name, "disconnected from MCP server");
    }

    fn connection_error(&self, message: String) -> McpError {
        McpError::Connection {
            server: self.config.name.clone(),
            message,
        }
    }

    fn protocol_error(&self, message: String) -> McpError {
        McpError::Protocol {
            server: self.config.name.clone(),
            message,
        }
    }

    fn not_connected(&self) -> McpError {
        McpError::NotConnected {
            server: self.config.name.clone(),
        }
    }

    fn already_connected(&self) -> McpError {
        McpError::AlreadyConnected {
            server: self.config.name.clone(),
        }
    }
}

/// SIGKILL everything left in the server's process group (`pgid` = child pid).
#[cfg(unix)]
fn kill_process_group(server: &str, group: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pgid) = group.and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => debug!(server, pgid, "killed MCP server process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => debug!(server, pgid, error = %e, "failed to kill MCP server process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_server: &str, _group: Option<u32>) {}

async fn handshake(server: &str, channel: &mut RpcChannel) -> Result<InitializeResult, McpError> {
    let result = channel.request(METHOD_INITIALIZE, initialize_params()).await?;
    let init: InitializeResult = serde_json::from_value(result).map_err(|e| McpError::Protocol {
        server: server.to_string(),
        message: format!("invalid initialize result: {e}"),
    })?;
    channel.notify(METHOD_INITIALIZED, json!({})).await?;
    Ok(init)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_server, weather_server};

    fn client(name: &str) -> McpClient {
        McpClient::new(McpServerConfig {
            name: name.into(),
            command: "unused".into(),
            ..Default::default()
        })
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_list_before_connect_fails() {
        let c = client("weather");
        let err = c.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_call_before_connect_fails() {
        let c = client("weather");
        let err = c.call_tool("get_weather", Map::new()).await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_connect_list_and_call() {
        let c = client("weather");
        let server = weather_server();
        c.connect_with(server.reader, server.writer).await.unwrap();
        assert!(c.is_connected().await);

        let tools = c.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "get_weather");
        assert_eq!(tools[0].input_schema["required"][0], "city");

        let text = c
            .call_tool("get_weather", args(json!({ "city": "Paris" })))
            .await
            .unwrap();
        assert_eq!(text, "18C, cloudy");

        let calls = server.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("get_weather".to_string(), json!({ "city": "Paris" }))]);
    }

    #[tokio::test]
    async fn test_connect_twice_fails_fast() {
        let c = client("weather");
        let server = weather_server();
        c.connect_with(server.reader, server.writer).await.unwrap();

        let again = weather_server();
        let err = c.connect_with(again.reader, again.writer).await.unwrap_err();
        assert!(matches!(err, McpError::AlreadyConnected { .. }));
    }

    #[tokio::test]
    async fn test_handshake_failure_is_connection_error() {
        let c = client("broken");
        let server = fake_server(|method, _params| match method {
            "initialize" => Err((-32603, "boom".into())),
            _ => Ok(json!({})),
        });
        let err = c.connect_with(server.reader, server.writer).await.unwrap_err();
        assert!(matches!(err, McpError::Connection { .. }));
        assert!(!c.is_connected().await);
    }

    #[tokio::test]
    async fn test_malformed_initialize_is_connection_error() {
        let c = client("odd");
        let server = fake_server(|_, _| Ok(json!("ready")));
        let err = c.connect_with(server.reader, server.writer).await.unwrap_err();
        assert!(matches!(err, McpError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_list_follows_cursor() {
        let c = client("paged");
        let server = fake_server(|method, params| match method {
            "initialize" => Ok(json!({ "protocolVersion": "2024-11-05" })),
            "tools/list" => match params.get("cursor").and_then(Value::as_str) {
                None => Ok(json!({ "tools": [{ "name": "a" }], "nextCursor": "p2" })),
                Some("p2") => Ok(json!({ "tools": [{ "name": "b" }] })),
                Some(_) => Err((-32602, "bad cursor".into())),
            },
            _ => Ok(json!({})),
        });
        c.connect_with(server.reader, server.writer).await.unwrap();

        let names: Vec<String> = c.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_tool_reported_error() {
        let c = client("weather");
        let server = fake_server(|method, _| match method {
            "initialize" => Ok(json!({})),
            "tools/call" => Ok(json!({
                "content": [{ "type": "text", "text": "city not found" }],
                "isError": true
            })),
            _ => Ok(json!({})),
        });
        c.connect_with(server.reader, server.writer).await.unwrap();

        let err = c.call_tool("get_weather", Map::new()).await.unwrap_err();
        match err {
            McpError::ToolReported { tool, message, .. } => {
                assert_eq!(tool, "get_weather");
                assert_eq!(message, "city not found");
            }
            other => panic!("expected ToolReported, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_call_without_text_content() {
        let c = client("images");
        let server = fake_server(|method, _| match method {
            "tools/call" => Ok(json!({ "content": [{ "type": "image", "data": "AA", "mimeType": "image/png" }] })),
            _ => Ok(json!({})),
        });
        c.connect_with(server.reader, server.writer).await.unwrap();

        let err = c.call_tool("snapshot", Map::new()).await.unwrap_err();
        assert!(matches!(err, McpError::Invocation { .. }));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let c = client("weather");
        let server = weather_server();
        c.connect_with(server.reader, server.writer).await.unwrap();

        c.disconnect().await;
        assert!(!c.is_connected().await);
        c.disconnect().await;

        let err = c.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_connection_error() {
        let c = McpClient::new(McpServerConfig {
            name: "missing".into(),
            command: "/definitely/not/a/real/mcp-server".into(),
            ..Default::default()
        });
        let err = c.connect().await.unwrap_err();
        match err {
            McpError::Connection { server, message } => {
                assert_eq!(server, "missing");
                assert!(message.contains("failed to spawn"));
            }
            other => panic!("expected Connection error, got {other:?}"),
        }
    }

    /// Answers the handshake and one `tools/list`, starting a background
    /// `sleep` first and writing its pid to `$1`. Never exits on its own.
    #[cfg(target_os = "linux")]
    const STUB_SERVER: &str = r#"
read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"stub","version":"0"}}}'
read -r line
read -r line
sleep 30 &
echo $! > "$1"
printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"noop","inputSchema":{"type":"object"}}]}}'
wait
"#;

    /// Alive and not a zombie.
    #[cfg(target_os = "linux")]
    fn is_running(pid: i32) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat"))
            .ok()
            .and_then(|stat| stat.rsplit(')').next().map(|rest| !rest.trim_start().starts_with('Z')))
            .unwrap_or(false)
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_disconnect_kills_background_processes() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("sleep.pid");
        let c = McpClient::new(McpServerConfig {
            name: "stub".into(),
            command: "sh".into(),
            args: vec![
                "-c".into(),
                STUB_SERVER.into(),
                "stub".into(),
                pid_file.to_string_lossy().into_owned(),
            ],
            ..Default::default()
        });

        c.connect().await.unwrap();
        let tools = c.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "noop");

        let pid: i32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        assert!(is_running(pid));

        c.disconnect().await;
        assert!(!c.is_connected().await);

        for _ in 0..50 {
            if !is_running(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("background process {pid} survived disconnect");
    }
}
