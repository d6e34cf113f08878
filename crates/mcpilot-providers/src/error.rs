use thiserror::Error;

/// Upstream chat-completion failures. Network, auth, and rate limits are
/// not told apart beyond the HTTP status.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to chat-completion API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat-completion API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse chat-completion response: {0}")]
    Decode(String),

    #[error("chat-completion response contained no choices")]
    NoChoices,
}
