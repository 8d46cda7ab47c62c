//! HTTP backend for OpenAI and Azure OpenAI chat completions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::{ChatBackend, Result, StructuredRequest};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which flavour of the chat-completions API to address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// `{base_url}/chat/completions` with bearer auth.
    OpenAi { base_url: String },
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions` with `api-key` auth.
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

/// Backend speaking the chat-completions REST API.
pub struct OpenAiBackend {
    client: Client,
    provider: Provider,
    api_key: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

impl OpenAiBackend {
    /// Create a backend for the given provider.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(provider, api_key, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a backend with an explicit request timeout.
    pub fn with_timeout(
        provider: Provider,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider,
            api_key,
            timeout_secs,
        })
    }

    /// Create an OpenAI backend reading the key from an environment variable.
    pub fn from_env(provider: Provider, key_var: &str, timeout_secs: u64) -> Result<Self> {
        let api_key = std::env::var(key_var)
            .map_err(|_| LlmError::Config(format!("{} not set", key_var)))?;
        Self::with_timeout(provider, api_key, timeout_secs)
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        match &self.provider {
            Provider::OpenAi { base_url } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            Provider::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.trim_end_matches('/'),
                deployment,
                api_version
            ),
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.provider {
            Provider::OpenAi { .. } => builder.bearer_auth(&self.api_key),
            Provider::Azure { .. } => builder.header("api-key", &self.api_key),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &StructuredRequest) -> Result<String> {
        let start = std::time::Instant::now();
        let url = self.completions_url();

        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    warn!(error = %e, "chat request failed");
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "chat API error");
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited(error_text));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            chars = content.len(),
            "chat completion"
        );

        Ok(content)
    }

    fn name(&self) -> &str {
        match self.provider {
            Provider::OpenAi { .. } => "openai",
            Provider::Azure { .. } => "azure-openai",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_url() {
        let backend = OpenAiBackend::new(
            Provider::OpenAi {
                base_url: "https://api.openai.com/v1/".to_string(),
            },
            "sk-test",
        )
        .unwrap();

        assert_eq!(
            backend.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(backend.name(), "openai");
    }

    #[test]
    fn test_azure_url() {
        let backend = OpenAiBackend::new(
            Provider::Azure {
                endpoint: "https://example.openai.azure.com/".to_string(),
                deployment: "gpt4o".to_string(),
                api_version: "2024-02-15-preview".to_string(),
            },
            "key",
        )
        .unwrap();

        assert_eq!(
            backend.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = OpenAiBackend::new(
            Provider::OpenAi {
                base_url: "https://api.openai.com/v1".to_string(),
            },
            "  ",
        );
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}],"usage":null}"#;
        let raw: ChatResponseRaw = serde_json::from_str(body).unwrap();
        assert_eq!(raw.choices[0].message.content.as_deref(), Some("{\"a\":1}"));
    }
}
