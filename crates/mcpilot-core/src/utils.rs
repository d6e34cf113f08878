//! Utility helpers — path resolution and string shaping for logs.

use std::path::PathBuf;

/// Get the mcpilot data directory (e.g. `~/.mcpilot/`).
pub fn get_data_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".mcpilot")
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Mask a secret for display, keeping a short prefix.
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "(unset)".to_string();
    }
    let prefix: String = secret.chars().take(3).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_string("日本語のテキスト", 5), "日本...");
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("sk-abcdef"), "sk-***");
        assert_eq!(redact(""), "(unset)");
        assert!(!redact("secret-key").contains("key"));
    }

    #[test]
    fn test_data_path_name() {
        assert!(get_data_path().ends_with(".mcpilot"));
    }
}
