//! Configuration management for nasha using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;
use crate::services::PipelineOptions;

/// Default rows per classification request for analysis.
pub const DEFAULT_CLASSIFY_BATCH_SIZE: usize = 20;

/// Default rows per classification + extraction round for transforms.
pub const DEFAULT_TRANSFORM_BATCH_SIZE: usize = 10;

/// Batch sizing for capability requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, prefer::FromValue)]
pub struct BatchConfig {
    #[serde(default = "default_classify_batch_size")]
    #[prefer(default)]
    pub classify_batch_size: usize,
    #[serde(default = "default_transform_batch_size")]
    #[prefer(default)]
    pub transform_batch_size: usize,
}

fn default_classify_batch_size() -> usize {
    DEFAULT_CLASSIFY_BATCH_SIZE
}

fn default_transform_batch_size() -> usize {
    DEFAULT_TRANSFORM_BATCH_SIZE
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            classify_batch_size: DEFAULT_CLASSIFY_BATCH_SIZE,
            transform_batch_size: DEFAULT_TRANSFORM_BATCH_SIZE,
        }
    }
}

impl BatchConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Brand identity stamped into outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, prefer::FromValue)]
pub struct BrandConfig {
    /// Brand column value for platforms that carry one.
    #[serde(default = "default_brand")]
    #[prefer(default)]
    pub name: String,
    /// Prefix for output file names (`{prefix}_{platform}.csv`).
    #[serde(default = "default_brand")]
    #[prefer(default)]
    pub file_prefix: String,
}

fn default_brand() -> String {
    "Nasha".to_string()
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: default_brand(),
            file_prefix: default_brand(),
        }
    }
}

impl BrandConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// LLM configuration for classification and extraction.
    #[serde(default, skip_serializing_if = "LlmConfig::is_default")]
    #[prefer(default)]
    pub llm: LlmConfig,
    /// Batch sizing.
    #[serde(default, skip_serializing_if = "BatchConfig::is_default")]
    #[prefer(default)]
    pub batch: BatchConfig,
    /// Brand identity.
    #[serde(default, skip_serializing_if = "BrandConfig::is_default")]
    #[prefer(default)]
    pub brand: BrandConfig,
    /// Directory for converted files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers nasha config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("nasha").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}; using defaults", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Directory converted files are written to; the working directory
    /// when unset.
    pub fn output_dir(&self) -> PathBuf {
        let base = self.base_dir().unwrap_or_else(|| PathBuf::from("."));
        match self.output_dir.as_deref() {
            Some(dir) => self.resolve_path(dir, &base),
            None => PathBuf::from("."),
        }
    }

    /// Apply command-line overrides for the LLM backend.
    pub fn apply_llm_overrides(&mut self, model: Option<String>, endpoint: Option<String>) {
        if let Some(model) = model {
            self.llm.set_model(model);
        }
        if let Some(endpoint) = endpoint {
            self.llm.set_endpoint(endpoint);
        }
    }

    /// Pipeline tunables derived from this configuration.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            classify_batch_size: self.batch.classify_batch_size.max(1),
            transform_batch_size: self.batch.transform_batch_size.max(1),
            classify_max_tokens: self.llm.app.max_tokens,
            extract_max_tokens: self.llm.app.extract_max_tokens,
            max_content_chars: self.llm.max_content_chars(),
            brand: self.brand.name.clone(),
            file_prefix: self.brand.file_prefix.clone(),
        }
    }
}
