//! Connected MCP servers for the lifetime of one chat session.

use std::sync::Arc;

use tracing::warn;

use mcpilot_agent::tools::register_server_tools;
use mcpilot_agent::ToolRegistry;
use mcpilot_core::config::McpServerConfig;
use mcpilot_mcp::McpClient;

use crate::helpers;

/// Owns every successfully connected client. Call [`shutdown`](Self::shutdown)
/// on the way out; `kill_on_drop` on each child covers panics.
pub struct ConnectedServers {
    clients: Vec<Arc<McpClient>>,
}

impl ConnectedServers {
    /// Connect each configured server in order. A server that fails to start
    /// is reported and skipped.
    pub async fn connect_all(configs: &[McpServerConfig]) -> Self {
        let mut clients = Vec::with_capacity(configs.len());
        for config in configs {
            helpers::print_connecting(config);
            let client = Arc::new(McpClient::new(config.clone()));
            match client.connect().await {
                Ok(()) => clients.push(client),
                Err(e) => {
                    warn!(server = %config.name, error = %e, "skipping MCP server");
                    helpers::print_server_error(&config.name, &e);
                }
            }
        }
        Self { clients }
    }

    /// Wrap clients that are already connected.
    #[cfg(test)]
    pub fn from_clients(clients: Vec<Arc<McpClient>>) -> Self {
        Self { clients }
    }

    /// List tools from every client and register them in connection order.
    ///
    /// A server whose tool listing fails contributes nothing and is
    /// disconnected.
    pub async fn build_registry(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for client in &self.clients {
            match register_server_tools(&mut registry, client).await {
                Ok(count) => helpers::print_server_ready(client.name(), count),
                Err(e) => {
                    warn!(server = %client.name(), error = %e, "failed to list tools");
                    helpers::print_server_error(client.name(), &e);
                    client.disconnect().await;
                }
            }
        }
        registry
    }

    /// Number of clients still held.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Disconnect every client.
    pub async fn shutdown(self) {
        for client in &self.clients {
            client.disconnect().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpilot_mcp::testing::{fake_server, weather_server, FakeServer};
    use serde_json::json;

    async fn connected(name: &str, server: FakeServer) -> Arc<McpClient> {
        let client = Arc::new(McpClient::new(McpServerConfig {
            name: name.into(),
            command: "unused".into(),
            ..Default::default()
        }));
        client.connect_with(server.reader, server.writer).await.unwrap();
        client
    }

    #[tokio::test]
    async fn unstartable_server_is_skipped() {
        let configs = vec![McpServerConfig {
            name: "missing".into(),
            command: "/nonexistent/mcpilot-test-server".into(),
            ..Default::default()
        }];
        let servers = ConnectedServers::connect_all(&configs).await;
        assert_eq!(servers.len(), 0);
        assert!(servers.build_registry().await.is_empty());
    }

    #[tokio::test]
    async fn registry_collects_tools_from_all_servers() {
        let clock = fake_server(|method, _| match method {
            "initialize" => Ok(json!({ "protocolVersion": "2024-11-05" })),
            "tools/list" => Ok(json!({ "tools": [{ "name": "get_time", "description": "Current time" }] })),
            _ => Err((-32601, "unsupported".into())),
        });
        let weather = connected("weather", weather_server()).await;
        let clock = connected("clock", clock).await;
        let servers = ConnectedServers::from_clients(vec![weather.clone(), clock.clone()]);

        let registry = servers.build_registry().await;

        assert_eq!(registry.tool_names(), vec!["get_weather", "get_time"]);
        assert_eq!(registry.source_of("get_time"), Some("clock"));

        servers.shutdown().await;
        assert!(!weather.is_connected().await);
        assert!(!clock.is_connected().await);
    }

    #[tokio::test]
    async fn failed_listing_contributes_nothing() {
        let broken = fake_server(|method, _| match method {
            "initialize" => Ok(json!({ "protocolVersion": "2024-11-05" })),
            _ => Err((-32603, "internal error".into())),
        });
        let weather = connected("weather", weather_server()).await;
        let broken = connected("broken", broken).await;
        let servers = ConnectedServers::from_clients(vec![broken.clone(), weather]);

        let registry = servers.build_registry().await;

        assert_eq!(registry.tool_names(), vec!["get_weather"]);
        assert!(!broken.is_connected().await);
        servers.shutdown().await;
    }
}
