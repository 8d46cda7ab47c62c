//! Chat backend implementations.

#[cfg(feature = "http")]
pub mod openai;

pub mod mock;

use async_trait::async_trait;

use crate::{Result, StructuredRequest};

/// Trait for structured chat-completion backends.
///
/// A backend performs exactly one outbound call per `complete` and returns
/// the raw JSON text of the model's answer. Callers own retries, timeouts
/// and deserialization.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the request and return the answer content.
    async fn complete(&self, request: &StructuredRequest) -> Result<String>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}
