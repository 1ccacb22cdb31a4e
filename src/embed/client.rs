//! HTTP embedding client for OpenAI and Ollama

use crate::config::{EmbedConfig, EmbedProvider};
use crate::embed::{EmbedError, EmbedResult, EmbeddingBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for remote embedding APIs
pub struct EmbeddingClient {
    client: Client,
    provider: EmbedProvider,
    model: String,
    api_key: Option<String>,
    api_base_url: String,
    dimensions: usize,
}

impl EmbeddingClient {
    /// Create a new embedding client based on configuration
    pub fn new(config: &EmbedConfig) -> EmbedResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::Config(e.to_string()))?;

        let api_base_url = match (&config.api_base_url, config.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, EmbedProvider::OpenAI) => "https://api.openai.com/v1".to_string(),
            (None, EmbedProvider::Ollama) => "http://localhost:11434".to_string(),
            (None, EmbedProvider::Mock) => {
                return Err(EmbedError::Config(
                    "mock provider has no HTTP backend".to_string(),
                ))
            }
        };

        if config.provider == EmbedProvider::OpenAI && config.api_key.is_none() {
            return Err(EmbedError::Config("OpenAI requires API key".to_string()));
        }

        Ok(Self {
            client,
            provider: config.provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_base_url,
            dimensions: config.dimensions,
        })
    }

    async fn openai_embedding(&self, text: &str) -> EmbedResult<Vec<f32>> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: &'a str,
            model: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            dimensions: Option<usize>,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<OpenAIData>,
        }

        #[derive(Deserialize)]
        struct OpenAIData {
            embedding: Vec<f32>,
        }

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbedError::Config("OpenAI requires API key".to_string()))?;

        // Only the v3 models accept a requested dimension
        let dimensions = self
            .model
            .starts_with("text-embedding-3")
            .then_some(self.dimensions);

        let url = format!("{}/embeddings", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&OpenAIRequest {
                input: text,
                model: &self.model,
                dimensions,
            })
            .send()
            .await
            .map_err(|e| EmbedError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Api(format!("OpenAI returned {}: {}", status, error_text)));
        }

        let result: OpenAIResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::MalformedPayload(e.to_string()))?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbedError::MalformedPayload("response contained no embedding".to_string()))
    }

    async fn ollama_embedding(&self, text: &str) -> EmbedResult<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .json(&OllamaRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| EmbedError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Api(format!("Ollama returned {}: {}", status, error_text)));
        }

        let result: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::MalformedPayload(e.to_string()))?;
        Ok(result.embedding)
    }
}

#[async_trait]
impl EmbeddingBackend for EmbeddingClient {
    fn name(&self) -> &str {
        self.provider.as_str()
    }

    async fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        match self.provider {
            EmbedProvider::OpenAI => self.openai_embedding(text).await,
            EmbedProvider::Ollama => self.ollama_embedding(text).await,
            EmbedProvider::Mock => Err(EmbedError::Config(
                "mock provider has no HTTP backend".to_string(),
            )),
        }
    }
}
