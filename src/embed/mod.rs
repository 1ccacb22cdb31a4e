//! Embedding provider
//!
//! Turns concept names into fixed-dimension vectors. Vectors come from a
//! remote backend when one is configured and from the deterministic
//! generator in [`fallback`] otherwise. Backend failures never reach the
//! caller: they are logged and replaced by the fallback vector.

pub mod client;
pub mod fallback;

use crate::config::{EmbedConfig, EmbedProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use questgraph_algorithms::SimilarityMatrix;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub use client::EmbeddingClient;
pub use fallback::deterministic_embedding;

/// Embed errors
#[derive(Error, Debug)]
pub enum EmbedError {
    /// Backend answered with an error status
    #[error("Embedding API error: {0}")]
    Api(String),

    /// Backend unreachable or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered without a usable vector
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type EmbedResult<T> = Result<T, EmbedError>;

/// Shared, immutable embedding vector
pub type Embedding = Arc<Vec<f32>>;

/// A remote source of embeddings
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Short identifier recorded as graph provenance (e.g. "openai")
    fn name(&self) -> &str;

    /// Embed a single text
    async fn embed(&self, text: &str) -> EmbedResult<Vec<f32>>;
}

/// Embeddings for a batch of texts together with their pairwise similarities
#[derive(Debug, Clone)]
pub struct SimilarityBatch {
    pub embeddings: Vec<Embedding>,
    pub matrix: SimilarityMatrix,
}

/// Caching embedding provider with deterministic fallback
pub struct EmbeddingProvider {
    backend: Option<Arc<dyn EmbeddingBackend>>,
    dimensions: usize,
    cache: DashMap<String, Embedding>,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("method", &self.method())
            .field("dimensions", &self.dimensions)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl EmbeddingProvider {
    /// Provider that only uses the deterministic generator
    pub fn mock(dimensions: usize) -> Self {
        Self {
            backend: None,
            dimensions,
            cache: DashMap::new(),
        }
    }

    /// Provider backed by a remote service
    pub fn with_backend(backend: Arc<dyn EmbeddingBackend>, dimensions: usize) -> Self {
        Self {
            backend: Some(backend),
            dimensions,
            cache: DashMap::new(),
        }
    }

    /// Build a provider from configuration
    pub fn from_config(config: &EmbedConfig) -> EmbedResult<Self> {
        match config.provider {
            EmbedProvider::Mock => Ok(Self::mock(config.dimensions)),
            _ => {
                let client = EmbeddingClient::new(config)?;
                Ok(Self::with_backend(Arc::new(client), config.dimensions))
            }
        }
    }

    /// Which embedding source is active: the backend name, or "mock"
    pub fn method(&self) -> &str {
        self.backend
            .as_ref()
            .map(|b| b.name())
            .unwrap_or(EmbedProvider::Mock.as_str())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Embed one text, consulting the cache first
    pub async fn embed(&self, text: &str) -> Embedding {
        if let Some(hit) = self.cache.get(text).map(|entry| Arc::clone(entry.value())) {
            return hit;
        }

        let vector = match &self.backend {
            Some(backend) => match backend.embed(text).await.and_then(|v| self.validate(v)) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Embedding backend '{}' failed, using fallback: {}", backend.name(), e);
                    deterministic_embedding(text, self.dimensions)
                }
            },
            None => deterministic_embedding(text, self.dimensions),
        };

        let vector = Arc::new(vector);
        self.cache.insert(text.to_string(), Arc::clone(&vector));
        vector
    }

    /// Embed every text concurrently; output order matches input order
    pub async fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Embedding> {
        debug!("Embedding batch of {} texts", texts.len());
        futures::future::join_all(texts.iter().map(|t| self.embed(t.as_ref()))).await
    }

    /// Embed a batch and compute its pairwise cosine similarities
    pub async fn similarity_matrix<S: AsRef<str>>(&self, texts: &[S]) -> SimilarityBatch {
        let embeddings = self.embed_batch(texts).await;
        let rows: Vec<&[f32]> = embeddings.iter().map(|e| e.as_slice()).collect();
        let matrix = SimilarityMatrix::from_vectors(&rows);
        SimilarityBatch { embeddings, matrix }
    }

    fn validate(&self, vector: Vec<f32>) -> EmbedResult<Vec<f32>> {
        if vector.len() != self.dimensions {
            return Err(EmbedError::MalformedPayload(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(EmbedError::MalformedPayload("non-finite component".to_string()));
        }
        Ok(vector)
    }
}
