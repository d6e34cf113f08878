//! In-memory MCP server for tests: a duplex pipe plus a scripted handler.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::io::DuplexStream;

/// Client-side ends of a fake server, plus a log of `tools/call` requests.
pub struct FakeServer {
    pub reader: ReadHalf<DuplexStream>,
    pub writer: WriteHalf<DuplexStream>,
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
}

/// Spawn a server task that answers every request via `handler(method, params)`.
///
/// `Err((code, message))` becomes a JSON-RPC error response. Notifications
/// are read and dropped.
pub fn fake_server<F>(handler: F) -> FakeServer
where
    F: Fn(&str, &Value) -> Result<Value, (i64, String)> + Send + 'static,
{
    let (client_io, server_io) = duplex(64 * 1024);
    let (reader, writer) = split(client_io);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&calls);

    tokio::spawn(async move {
        let (server_read, mut server_write) = split(server_io);
        let mut lines = BufReader::new(server_read).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let Ok(message) = serde_json::from_str::<Value>(&line) else {
                continue;
            };
            let Some(id) = message.get("id").cloned() else {
                continue;
            };
            let method = message.get("method").and_then(Value::as_str).unwrap_or_default();
            let params = message.get("params").cloned().unwrap_or(Value::Null);

            if method == "tools/call" {
                let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
                log.lock().unwrap().push((name.to_string(), arguments));
            }

            let reply = match handler(method, &params) {
                Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                Err((code, text)) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": code, "message": text }
                }),
            };
            if server_write
                .write_all(format!("{reply}\n").as_bytes())
                .await
                .is_err()
            {
                break;
            }
        }
    });

    FakeServer {
        reader,
        writer,
        calls,
    }
}

/// A server exposing `get_weather(city)` that always answers `"18C, cloudy"`.
pub fn weather_server() -> FakeServer {
    fake_server(|method, _params| match method {
        "initialize" => Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "weather", "version": "1.0.0" }
        })),
        "tools/list" => Ok(json!({
            "tools": [{
                "name": "get_weather",
                "description": "Current weather for a city",
                "inputSchema": {
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"]
                }
            }]
        })),
        "tools/call" => Ok(json!({ "content": [{ "type": "text", "text": "18C, cloudy" }] })),
        other => Err((-32601, format!("unknown method {other}"))),
    })
}
