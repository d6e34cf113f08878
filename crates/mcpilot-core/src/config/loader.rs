//! Config loader — reads the JSON config file, then merges env vars.
//!
//! # Lookup
//! 1. An explicit path (from `--config`)
//! 2. `./config.json`
//! 3. `~/.mcpilot/config.json`
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. The JSON file
//! 3. Environment variables `MCPILOT_<FIELD>` (a `.env` file in the working
//!    directory is loaded first)

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::debug;

use super::error::ConfigError;
use super::schema::Config;

/// File name looked up in the working directory and the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

static ENV_LOADER: Once = Once::new();

/// Load `.env` from the working directory, once per process.
fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("loaded environment from {}", path.display());
        }
    });
}

/// Pick the config file to read.
///
/// An explicit path always wins, even if it does not exist (so the error
/// names the path the user asked for).
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return local;
    }
    let home = crate::utils::get_data_path().join(CONFIG_FILE_NAME);
    if home.is_file() {
        return home;
    }
    local
}

/// Load, override, and validate the configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    ensure_env_loaded();
    let path = resolve_config_path(path);
    let config = read_config(&path)?;
    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Read and parse one config file.
fn read_config(path: &Path) -> Result<Config, ConfigError> {
    debug!("Loading config from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply environment overrides on top of a loaded config.
///
/// Supported overrides:
/// - `MCPILOT_MODEL` → `model`
/// - `MCPILOT_API_KEY` → `api_key`
/// - `MCPILOT_BASE_URL` → `base_url`
/// - `MCPILOT_SYSTEM_PROMPT` → `system_prompt`
fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(val) = lookup("MCPILOT_MODEL") {
        config.model = val;
    }
    if let Some(val) = lookup("MCPILOT_API_KEY") {
        config.api_key = val;
    }
    if let Some(val) = lookup("MCPILOT_BASE_URL") {
        config.base_url = val;
    }
    if let Some(val) = lookup("MCPILOT_SYSTEM_PROMPT") {
        config.system_prompt = val;
    }
    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
