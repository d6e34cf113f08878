//! Tool trait — what the registry needs from anything the model can call.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use mcpilot_core::types::ToolDefinition;

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// A named, invocable tool with a JSON Schema for its arguments.
///
/// The registry advertises tools via `to_definition()` and dispatches calls
/// via `execute()`. In mcpilot every tool is backed by an MCP server, but
/// the loop only ever sees this trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call this tool.
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments object.
    fn parameters(&self) -> Value;

    /// Run the tool. The returned text is handed to the model verbatim.
    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String>;

    /// Manifest entry sent with the first request of a turn.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters())
    }

    /// `name: description`, the form used in the system prompt.
    fn summary_line(&self) -> String {
        format!("{}: {}", self.name(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct DummyTool;

    #[async_trait]
    impl Tool for DummyTool {
        fn name(&self) -> &str {
            "dummy"
        }
        fn description(&self) -> &str {
            "A test tool"
        }
        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "msg": { "type": "string" } },
                "required": ["msg"]
            })
        }
        async fn execute(&self, _params: HashMap<String, Value>) -> anyhow::Result<String> {
            Ok("ok".into())
        }
    }

    #[test]
    fn test_to_definition_default() {
        let def = DummyTool.to_definition();
        assert_eq!(def.function.name, "dummy");
        assert_eq!(def.function.description, "A test tool");
        assert_eq!(def.function.parameters["required"][0], "msg");
        assert_eq!(def.tool_type, "function");
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(DummyTool.summary_line(), "dummy: A test tool");
    }
}
