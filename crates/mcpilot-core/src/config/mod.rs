//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use mcpilot_core::config;
//!
//! let cfg = config::load_config(None)?;
//! println!("Model: {}", cfg.model);
//! # Ok::<(), mcpilot_core::config::ConfigError>(())
//! ```

pub mod error;
pub mod loader;
pub mod schema;

// Re-export key types
pub use error::ConfigError;
pub use loader::{load_config, resolve_config_path, CONFIG_FILE_NAME};
pub use schema::{Config, McpServerConfig, DEFAULT_SYSTEM_PROMPT, TOOLS_PLACEHOLDER};
