//! Shared CLI helpers — status lines, response printing, the thinking marker.

use std::fmt::Display;

use colored::Colorize;

use mcpilot_core::config::{Config, McpServerConfig};

/// Print the model and endpoint being used. The API key is never shown.
pub fn print_startup(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    println!("{}  v{}", "mcpilot".cyan().bold(), version.dimmed());
    println!("{} {}", "Model:".dimmed(), config.model);
    println!("{} {}", "Base URL:".dimmed(), config.base_url);
}

pub fn print_connecting(server: &McpServerConfig) {
    println!(
        "{} {} ({})",
        "Connecting to MCP server:".dimmed(),
        server.name.bold(),
        server.display_command()
    );
}

pub fn print_server_ready(name: &str, tool_count: usize) {
    println!("  {} {name}: {tool_count} tool(s)", "✓".green());
}

pub fn print_server_error(name: &str, error: &dyn Display) {
    eprintln!("  {} {name}: {error}", "✗".red());
}

/// Print the `Available tools: a, b, c` line.
pub fn print_tools(names: &[String]) {
    println!("{}", format_tool_list(names));
}

pub fn format_tool_list(names: &[String]) -> String {
    format!("Available tools: {}", names.join(", "))
}

/// Print a turn's reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{} {response}", "Response:".cyan().bold());
}

/// Print a turn failure; the prompt resumes afterwards.
pub fn print_turn_error(error: &dyn Display) {
    eprintln!();
    eprintln!("{} {error}", "Error in prompt loop:".red());
}

/// Print a "thinking" placeholder while a turn runs.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_list_joined_with_commas() {
        let names = vec!["get_weather".to_string(), "get_time".to_string()];
        assert_eq!(format_tool_list(&names), "Available tools: get_weather, get_time");
    }

    #[test]
    fn tool_list_empty() {
        assert_eq!(format_tool_list(&[]), "Available tools: ");
    }
}
