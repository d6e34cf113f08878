//! Tool Registry — ordered name → tool map shared by every connected server.
//!
//! Registration order is preserved so the manifest and the system prompt list
//! tools the same way on every run.

use std::collections::HashMap;
use std::sync::Arc;

use mcpilot_core::types::ToolDefinition;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::base::Tool;
use crate::error::TurnError;

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

struct RegisteredTool {
    /// Name of the MCP server that contributed the tool.
    source: String,
    tool: Arc<dyn Tool>,
}

/// Stores tools in registration order and dispatches calls by name.
///
/// A later registration under an existing name replaces the earlier tool
/// in its original slot.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool` as contributed by `client_id`.
    pub fn register(&mut self, client_id: &str, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let entry = RegisteredTool {
            source: client_id.to_string(),
            tool,
        };

        match self.position(&name) {
            Some(index) => {
                warn!(
                    tool = %name,
                    previous = %self.tools[index].source,
                    replacement = %client_id,
                    "tool name collision, later registration wins"
                );
                self.tools[index] = entry;
            }
            None => {
                info!(tool = %name, server = %client_id, "registered tool");
                self.tools.push(entry);
            }
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.position(name).map(|i| &self.tools[i].tool)
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Which server contributed `name`.
    pub fn source_of(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.tools[i].source.as_str())
    }

    /// Names of all registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.tool.name().to_string()).collect()
    }

    /// Manifest entries for the model, in registration order.
    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.tool.to_definition()).collect()
    }

    /// One `name: description` line per tool, in registration order.
    pub fn tool_lines(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.tool.summary_line()).collect()
    }

    /// Invoke `name` with `params` and return its text output.
    pub async fn execute(&self, name: &str, params: HashMap<String, Value>) -> Result<String, TurnError> {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "tool not found");
            return Err(TurnError::UnknownTool {
                name: name.to_string(),
            });
        };

        match tool.execute(params).await {
            Ok(result) => {
                debug!(tool = name, result_len = result.len(), "tool result");
                Ok(result)
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                Err(TurnError::ToolInvocation {
                    tool: name.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.tool.name() == name)
    }
}
