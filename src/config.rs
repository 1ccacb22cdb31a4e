//! Runtime configuration
//!
//! Configuration can be read from a YAML file or assembled from the
//! environment. Every section has defaults, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedProvider {
    OpenAI,
    Ollama,
    /// Deterministic offline vectors, no network access
    #[default]
    Mock,
}

impl EmbedProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedProvider::OpenAI => "openai",
            EmbedProvider::Ollama => "ollama",
            EmbedProvider::Mock => "mock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(EmbedProvider::OpenAI),
            "ollama" => Some(EmbedProvider::Ollama),
            "mock" => Some(EmbedProvider::Mock),
            _ => None,
        }
    }
}

/// Configuration for the embedding provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Backend to call
    pub provider: EmbedProvider,
    /// Model name (e.g., "text-embedding-3-small", "nomic-embed-text")
    pub model: String,
    /// API key (OpenAI only)
    pub api_key: Option<String>,
    /// Base URL override
    pub api_base_url: Option<String>,
    /// Vector dimension, shared by the backend and the fallback generator
    pub dimensions: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            provider: EmbedProvider::Mock,
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            api_base_url: None,
            dimensions: 384,
            timeout_secs: 30,
        }
    }
}

/// Tuning knobs for graph construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Minimum cosine similarity for a similarity edge (exclusive)
    pub similarity_threshold: f32,
    /// k-means iteration cap
    pub max_iterations: usize,
    /// Fixed seed for k-means++ initialization; random when unset
    pub seed: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.4,
            max_iterations: questgraph_algorithms::DEFAULT_MAX_ITERATIONS,
            seed: None,
        }
    }
}

/// Location of persisted graphs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("graphs"),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestGraphConfig {
    pub embed: EmbedConfig,
    pub graph: GraphConfig,
    pub storage: StorageConfig,
}

impl QuestGraphConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Build configuration from process environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// `OPENAI_API_KEY` switches the provider to OpenAI only while it is
    /// still the default mock; a provider chosen in the config file or by
    /// `QUESTGRAPH_EMBED_PROVIDER` is kept.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.embed.api_key = Some(key);
            if self.embed.provider == EmbedProvider::Mock {
                self.embed.provider = EmbedProvider::OpenAI;
            }
        }
        if let Some(provider) = non_empty("QUESTGRAPH_EMBED_PROVIDER").and_then(|p| EmbedProvider::parse(&p)) {
            self.embed.provider = provider;
        }
        if let Some(model) = non_empty("QUESTGRAPH_EMBED_MODEL") {
            self.embed.model = model;
        }
        if let Some(url) = non_empty("QUESTGRAPH_EMBED_URL") {
            self.embed.api_base_url = Some(url);
        }
        if let Some(dir) = non_empty("QUESTGRAPH_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        self
    }
}
