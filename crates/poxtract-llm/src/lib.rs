//! Chat-completion abstraction layer for poxtract.
//!
//! This crate provides a unified interface for structured-output chat calls
//! across different backends:
//! - `OpenAiBackend` over HTTP for OpenAI and Azure OpenAI deployments
//! - `MockBackend` for deterministic tests

mod backend;
mod error;
mod message;
pub mod schema;

pub use backend::ChatBackend;
pub use backend::mock::MockBackend;
pub use error::LlmError;
pub use message::{ChatMessage, JsonSchemaFormat, ResponseFormat, Role, StructuredRequest};
pub use schema::strict_schema;

#[cfg(feature = "http")]
pub use backend::openai::{OpenAiBackend, Provider};

/// Result type for chat operations.
pub type Result<T> = std::result::Result<T, LlmError>;
