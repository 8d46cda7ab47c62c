//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the poxtract pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoxtractConfig {
    /// Chat backend configuration.
    pub llm: LlmConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Structured extraction configuration.
    pub extraction: ExtractionConfig,

    /// Address normalization configuration.
    pub address: AddressConfig,

    /// Output storage configuration.
    pub output: OutputConfig,
}

/// Which chat-completions API to call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Azure,
}

/// Chat backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,

    /// OpenAI base URL, or the Azure resource endpoint.
    pub base_url: String,

    /// Azure deployment name (ignored for OpenAI).
    pub deployment: String,

    /// Azure API version (ignored for OpenAI).
    pub api_version: String,

    /// Model name sent with each request.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Deadline for one extraction call, in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            deployment: "gpt4o".to_string(),
            api_version: "2024-02-15-preview".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: Some(0.0),
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read from each document (0 = unlimited).
    pub max_pages: usize,

    /// Minimum text length to consider a PDF text-based (0 = any text).
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 3,
            min_text_length: 0,
        }
    }
}

/// Structured extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Documents with more tokens than this are skipped.
    pub token_limit: usize,

    /// Company receiving the orders; the model is told to ignore it.
    pub ignore_company: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            token_limit: 3600,
            ignore_company: None,
        }
    }
}

/// Address normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressConfig {
    /// Lines scoring above this token-set similarity are duplicates (0-100).
    pub dedup_threshold: u8,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self { dedup_threshold: 85 }
    }
}

/// Output storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory standing in for blob storage.
    pub root: PathBuf,

    /// Queue receiving one message per record.
    pub queue_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("output"),
            queue_name: "order-processing-queue".to_string(),
        }
    }
}

impl PoxtractConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
