//! Configuration schema.
//!
//! The file on disk uses snake_case keys that map 1:1 onto these structs:
//! `model`, `api_key`, `base_url`, `system_prompt`, `mcp_servers`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::error::ConfigError;

/// Placeholder in `system_prompt` replaced by the tool list.
pub const TOOLS_PLACEHOLDER: &str = "{tools}";

/// Used when the config file does not set `system_prompt`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
You have access to the following tools:\n- {tools}\n\n\
Call a tool when it helps answer the user's question, then answer in plain language.";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration, loaded once at startup and passed by reference.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model identifier sent with every chat request.
    pub model: String,
    /// Bearer token for the chat-completion API.
    pub api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// System prompt template with one `{tools}` placeholder.
    pub system_prompt: String,
    /// Tool-provider processes to launch; one client per entry.
    pub mcp_servers: Vec<McpServerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: String::new(),
            api_key: String::new(),
            base_url: String::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            mcp_servers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("api_key", &crate::utils::redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("system_prompt", &self.system_prompt)
            .field("mcp_servers", &self.mcp_servers)
            .finish()
    }
}

impl Config {
    /// Check the fields the session cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("`model` must be set".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "`api_key` must be set (in the file or via MCPILOT_API_KEY)".into(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "`base_url` must be set (in the file or via MCPILOT_BASE_URL)".into(),
            ));
        }
        if !self.system_prompt.contains(TOOLS_PLACEHOLDER) {
            tracing::warn!("system_prompt has no {TOOLS_PLACEHOLDER} placeholder; tool list will not be shown to the model");
        }

        let mut seen = HashSet::new();
        for server in &self.mcp_servers {
            if server.name.trim().is_empty() {
                return Err(ConfigError::Invalid("mcp_servers entry with empty `name`".into()));
            }
            if server.command.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "mcp_servers entry '{}' has an empty `command`",
                    server.name
                )));
            }
            if !seen.insert(server.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate mcp_servers name '{}'",
                    server.name
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// MCP servers
// ─────────────────────────────────────────────

/// One tool-provider process: `command args...` with extra environment.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct McpServerConfig {
    /// Identifier used in logs and collision warnings.
    pub name: String,
    /// Executable to launch.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl McpServerConfig {
    /// `command arg1 arg2` for status lines.
    pub fn display_command(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
