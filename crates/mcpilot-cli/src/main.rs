//! mcpilot CLI — entry point.
//!
//! `mcpilot [--config PATH] [--logs]` loads the config, connects every
//! configured MCP server, and opens an interactive chat whose model can call
//! the servers' tools.

mod helpers;
mod repl;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, info};

use mcpilot_agent::ConversationLoop;
use mcpilot_core::config::{load_config, Config};
use mcpilot_providers::HttpProvider;

use crate::session::ConnectedServers;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Chat with an LLM that can call tools served over MCP
#[derive(Parser)]
#[command(name = "mcpilot", version, about, long_about = None)]
struct Cli {
    /// Path to config.json (default: ./config.json, then ~/.mcpilot/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    logs: bool,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    run_chat(&config).await
}

async fn run_chat(config: &Config) -> Result<()> {
    helpers::print_startup(config);

    let provider = HttpProvider::from_config(config).context("failed to create HTTP client")?;

    let servers = ConnectedServers::connect_all(&config.mcp_servers).await;
    debug!(connected = servers.len(), configured = config.mcp_servers.len(), "MCP servers ready");
    let tools = servers.build_registry().await;
    helpers::print_tools(&tools.tool_names());

    let conversation = ConversationLoop::new(
        Arc::new(provider),
        tools,
        config.model.clone(),
        config.system_prompt.clone(),
    );

    let (interrupt, interrupted) = watch::channel(false);
    let interrupts = tokio::spawn(watch_interrupts(interrupt));
    let result = repl::run(&conversation, interrupted).await;
    interrupts.abort();

    servers.shutdown().await;
    result
}

/// Turn SIGINT into a session-ending flag. A turn in flight settles first,
/// then the REPL exits and servers are shut down cleanly.
async fn watch_interrupts(interrupt: watch::Sender<bool>) {
    while tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupt received, ending session after the current turn");
        interrupt.send_replace(true);
    }
    debug!("interrupt handler unavailable");
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("mcpilot=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
