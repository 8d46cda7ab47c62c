//! Subcommand implementations and shared setup.

pub mod batch;
pub mod config;
pub mod email;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use poxtract_core::models::config::PoxtractConfig;
use poxtract_core::{ChatBackend, MockBackend, OrderPipeline, backend_from_config};

/// Options shared by every subcommand.
pub struct GlobalOpts {
    pub config: Option<String>,
    pub mock_response: Option<PathBuf>,
}

impl GlobalOpts {
    /// The config file in use: `--config`, or the user config file.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path)
    }

    /// Load the config file, or defaults when it does not exist yet.
    pub fn load_config(&self) -> anyhow::Result<PoxtractConfig> {
        let path = self.config_path();
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            Ok(PoxtractConfig::from_file(&path)?)
        } else if self.config.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        } else {
            Ok(PoxtractConfig::default())
        }
    }

    /// Build the extraction pipeline, with a canned backend if requested.
    pub fn pipeline(&self, config: &PoxtractConfig) -> anyhow::Result<OrderPipeline> {
        let backend: Arc<dyn ChatBackend> = match &self.mock_response {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                info!("Using canned extraction response from {}", path.display());
                Arc::new(MockBackend::new(content))
            }
            None => backend_from_config(&config.llm)?,
        };

        Ok(OrderPipeline::from_config(config, backend)?)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("poxtract")
        .join("config.json")
}

/// File name of `path` as a string, for record names and blob keys.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string()
}
