//! LLM provider layer for mcpilot.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — trait the conversation loop talks to
//! - [`http_provider::HttpProvider`] — OpenAI-compatible `/chat/completions` client
//! - [`error::ProviderError`] — why a chat request produced no response

pub mod error;
pub mod http_provider;
pub mod traits;

// Re-export main types for convenience
pub use error::ProviderError;
pub use http_provider::HttpProvider;
pub use traits::{LlmProvider, LlmRequestConfig};
