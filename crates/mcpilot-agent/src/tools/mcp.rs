//! MCP-backed tools — each advertised server tool becomes one registry entry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use mcpilot_mcp::{McpClient, McpError, McpToolInfo};

use super::base::Tool;
use super::registry::ToolRegistry;

/// A tool advertised by an MCP server, invoked through its client.
pub struct McpTool {
    client: Arc<McpClient>,
    info: McpToolInfo,
}

impl McpTool {
    pub fn new(client: Arc<McpClient>, info: McpToolInfo) -> Self {
        Self { client, info }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn parameters(&self) -> Value {
        self.info.input_schema.clone()
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let arguments = params.into_iter().collect();
        let text = self.client.call_tool(&self.info.name, arguments).await?;
        Ok(text)
    }
}

/// List every tool on `client` and register it under the client's name.
///
/// Returns the number of tools registered.
pub async fn register_server_tools(
    registry: &mut ToolRegistry,
    client: &Arc<McpClient>,
) -> Result<usize, McpError> {
    let tools = client.list_tools().await?;
    let count = tools.len();
    for info in tools {
        registry.register(client.name(), Arc::new(McpTool::new(Arc::clone(client), info)));
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpilot_core::config::McpServerConfig;
    use mcpilot_mcp::testing::{fake_server, weather_server};
    use serde_json::json;

    async fn connected(name: &str, server: mcpilot_mcp::testing::FakeServer) -> Arc<McpClient> {
        let client = Arc::new(McpClient::new(McpServerConfig {
            name: name.into(),
            command: "unused".into(),
            ..Default::default()
        }));
        client.connect_with(server.reader, server.writer).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_register_server_tools() {
        let client = connected("weather", weather_server()).await;
        let mut registry = ToolRegistry::new();

        let count = register_server_tools(&mut registry, &client).await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(registry.source_of("get_weather"), Some("weather"));
        let defs = registry.get_definitions();
        assert_eq!(defs[0].function.description, "Current weather for a city");
        assert_eq!(defs[0].function.parameters["required"][0], "city");
    }

    #[tokio::test]
    async fn test_execute_forwards_arguments() {
        let server = weather_server();
        let calls = Arc::clone(&server.calls);
        let client = connected("weather", server).await;
        let mut registry = ToolRegistry::new();
        register_server_tools(&mut registry, &client).await.unwrap();

        let mut params = HashMap::new();
        params.insert("city".into(), json!("Paris"));
        let text = registry.execute("get_weather", params).await.unwrap();

        assert_eq!(text, "18C, cloudy");
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("get_weather".to_string(), json!({ "city": "Paris" })));
    }

    #[tokio::test]
    async fn test_server_error_becomes_invocation_error() {
        let server = fake_server(|method, _| match method {
            "initialize" => Ok(json!({ "protocolVersion": "2024-11-05" })),
            "tools/list" => Ok(json!({ "tools": [{ "name": "explode" }] })),
            "tools/call" => Ok(json!({
                "content": [{ "type": "text", "text": "boom" }],
                "isError": true
            })),
            _ => Err((-32601, "nope".into())),
        });
        let client = connected("fragile", server).await;
        let mut registry = ToolRegistry::new();
        register_server_tools(&mut registry, &client).await.unwrap();

        let err = registry.execute("explode", HashMap::new()).await.unwrap_err();
        let crate::TurnError::ToolInvocation { tool, source } = err else {
            panic!("expected ToolInvocation");
        };
        assert_eq!(tool, "explode");
        assert!(matches!(
            source.downcast_ref::<McpError>(),
            Some(McpError::ToolReported { .. })
        ));
    }
}
