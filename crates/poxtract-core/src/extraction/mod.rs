//! Structured extraction of purchase order data from document text.

mod budget;
mod composer;
mod prompt;

pub use budget::{BudgetCheck, TokenBudget};
pub use composer::compose;
pub use prompt::system_instructions;

use crate::error::ExtractionError;
#[cfg(feature = "http")]
use crate::models::config::LlmProvider;
use crate::models::config::{ExtractionConfig, LlmConfig};
use crate::models::order::ExtractedData;
use poxtract_llm::schema::{schema_name, strict_schema};
use poxtract_llm::{ChatBackend, ChatMessage, StructuredRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default deadline for one extraction call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Asks a chat backend to fill [`ExtractedData`] from document text.
///
/// Each call makes exactly one request to the backend. Nothing is retried.
pub struct StructuredExtractor {
    backend: Arc<dyn ChatBackend>,
    model: String,
    instructions: Vec<ChatMessage>,
    temperature: Option<f32>,
    timeout: Duration,
    schema: serde_json::Value,
}

impl StructuredExtractor {
    /// Create an extractor with the default instructions and timeout.
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            instructions: system_instructions(None),
            temperature: Some(0.0),
            timeout: DEFAULT_TIMEOUT,
            schema: strict_schema::<ExtractedData>(),
        }
    }

    /// Create an extractor from configuration sections.
    pub fn from_config(
        backend: Arc<dyn ChatBackend>,
        llm: &LlmConfig,
        extraction: &ExtractionConfig,
    ) -> Self {
        Self::new(backend, llm.model.clone())
            .with_instructions(system_instructions(extraction.ignore_company.as_deref()))
            .with_temperature(llm.temperature)
            .with_timeout(Duration::from_secs(llm.timeout_secs))
    }

    pub fn with_instructions(mut self, instructions: Vec<ChatMessage>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Build the request sent for `text`.
    pub fn request(&self, text: &str) -> StructuredRequest {
        StructuredRequest::new(
            self.model.clone(),
            self.instructions.clone(),
            text,
            schema_name::<ExtractedData>(),
            self.schema.clone(),
        )
        .with_temperature(self.temperature)
    }

    /// Run the extraction and report any failure.
    pub async fn try_extract(&self, text: &str) -> Result<ExtractedData, ExtractionError> {
        let request = self.request(text);
        debug!(
            "Requesting extraction from {} ({} chars)",
            self.backend.name(),
            text.len()
        );

        let content = tokio::time::timeout(self.timeout, self.backend.complete(&request))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout.as_secs()))??;

        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| ExtractionError::Schema(e.to_string()))
    }

    /// Run the extraction; any failure yields an empty [`ExtractedData`].
    pub async fn extract(&self, text: &str) -> ExtractedData {
        match self.try_extract(text).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Extraction failed, using empty result: {}", e);
                ExtractedData::default()
            }
        }
    }
}

/// Create the HTTP chat backend described by `llm`.
///
/// The API key is read from the environment variable named in the config.
#[cfg(feature = "http")]
pub fn backend_from_config(llm: &LlmConfig) -> Result<Arc<dyn ChatBackend>, ExtractionError> {
    use poxtract_llm::{OpenAiBackend, Provider};

    let provider = match llm.provider {
        LlmProvider::OpenAi => Provider::OpenAi {
            base_url: llm.base_url.clone(),
        },
        LlmProvider::Azure => Provider::Azure {
            endpoint: llm.base_url.clone(),
            deployment: llm.deployment.clone(),
            api_version: llm.api_version.clone(),
        },
    };

    let backend = OpenAiBackend::from_env(provider, &llm.api_key_env, llm.timeout_secs)?;
    Ok(Arc::new(backend))
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
