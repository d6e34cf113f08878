//! Context builder — renders the system prompt that seeds a new conversation.

use mcpilot_core::config::TOOLS_PLACEHOLDER;
use mcpilot_core::types::Message;

use crate::tools::ToolRegistry;

/// Separator between tool lines; the template supplies the leading `"- "`.
const TOOL_LINE_SEPARATOR: &str = "\n- ";

/// Replace `{tools}` in `template` with the registry's tool lines.
///
/// An empty registry leaves the tool section empty.
pub fn render_system_prompt(template: &str, tools: &ToolRegistry) -> String {
    let lines = tools.tool_lines().join(TOOL_LINE_SEPARATOR);
    template.replace(TOOLS_PLACEHOLDER, &lines)
}

/// The history a fresh conversation starts from: one system message.
pub fn seed_history(template: &str, tools: &ToolRegistry) -> Vec<Message> {
    vec![Message::system(render_system_prompt(template, tools))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            self.1
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _params: HashMap<String, Value>) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_render_lists_tools_in_order() {
        let mut tools = ToolRegistry::new();
        tools.register("s", Arc::new(Named("get_weather", "Current weather")));
        tools.register("s", Arc::new(Named("get_time", "Current time")));

        let prompt = render_system_prompt("Tools:\n- {tools}\nBe brief.", &tools);
        assert_eq!(
            prompt,
            "Tools:\n- get_weather: Current weather\n- get_time: Current time\nBe brief."
        );
    }

    #[test]
    fn test_render_empty_registry() {
        let prompt = render_system_prompt("Tools:\n- {tools}", &ToolRegistry::new());
        assert_eq!(prompt, "Tools:\n- ");
    }

    #[test]
    fn test_render_without_placeholder() {
        let mut tools = ToolRegistry::new();
        tools.register("s", Arc::new(Named("t", "d")));
        assert_eq!(render_system_prompt("No tools here.", &tools), "No tools here.");
    }

    #[test]
    fn test_seed_history() {
        let history = seed_history("{tools}", &ToolRegistry::new());
        assert_eq!(history, vec![Message::system("")]);
    }
}
