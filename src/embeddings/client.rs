//! Embedding API clients for various providers

use async_trait::async_trait;
use futures::stream::StreamExt;
use futures::stream::{
    self,
};
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::EmbeddingBackend;
use crate::errors::HybridChatError;
use crate::errors::Result;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API (or any compatible endpoint)
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

impl EmbeddingProvider {
    /// Parse a provider name from configuration, defaulting to `OpenAI`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("ollama") {
            Self::Ollama
        } else {
            Self::OpenAI
        }
    }
}

#[derive(Serialize)]
struct OpenAIBatchRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Parse an `OpenAI` embeddings response body, honouring the `index` field
/// when the provider returns items out of order.
pub(crate) fn parse_openai_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut result: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| HybridChatError::EmbeddingError(format!("Failed to parse response: {e}")))?;

    if result.data.iter().all(|d| d.index.is_some()) {
        result.data.sort_by_key(|d| d.index);
    }

    if result.data.len() != expected {
        return Err(HybridChatError::EmbeddingError(format!(
            "Expected {expected} embeddings, got {}",
            result.data.len()
        )));
    }

    Ok(result.data.into_iter().map(|d| d.embedding).collect())
}

/// Parse an Ollama `/api/embeddings` response body
pub(crate) fn parse_ollama_embedding(body: &str) -> Result<Vec<f32>> {
    #[derive(Deserialize)]
    struct OllamaResponse {
        embedding: Vec<f32>,
    }

    let result: OllamaResponse = serde_json::from_str(body)
        .map_err(|e| HybridChatError::EmbeddingError(format!("Failed to parse response: {e}")))?;

    // Ollama answers an unknown model with an empty vector
    if result.embedding.is_empty() {
        return Err(HybridChatError::EmbeddingError(
            "Ollama returned an empty embedding".to_string(),
        ));
    }
    Ok(result.embedding)
}

/// Client for generating embeddings from various providers
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint,
            api_key,
            client,
        })
    }

    pub const fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    /// Generate embeddings for multiple texts in one call
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, count mismatch)
    pub async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match self.provider {
            EmbeddingProvider::OpenAI => self.generate_batch_openai(texts).await,
            EmbeddingProvider::Ollama => {
                // Ollama has no batch endpoint; fan out with a small window
                let concurrency = texts.len().min(8);
                let results: Vec<Result<Vec<f32>>> = stream::iter(texts.iter().cloned())
                    .map(|text| async move { self.generate_ollama(&text).await })
                    .buffered(concurrency)
                    .collect()
                    .await;

                results.into_iter().collect()
            }
        }
    }

    /// Generate embeddings in batch using `OpenAI` API
    async fn generate_batch_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            HybridChatError::ConfigError("OpenAI API key not provided".to_string())
        })?;

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {} items", texts.len());

        let request = OpenAIBatchRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HybridChatError::EmbeddingError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;
        parse_openai_embeddings(&body, texts.len())
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HybridChatError::EmbeddingError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;
        parse_ollama_embedding(&body)
    }
}

#[async_trait]
impl EmbeddingBackend for EmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_batch(texts).await
    }
}
