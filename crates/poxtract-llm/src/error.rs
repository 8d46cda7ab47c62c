//! Error types for the chat layer.

use thiserror::Error;

/// Errors that can occur during a chat-completion call.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Backend misconfigured (missing key, bad endpoint).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The call did not finish in time.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Quota or rate limit hit.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Non-success response from the API.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Response decoded but carried no content.
    #[error("empty response")]
    EmptyResponse,
}
