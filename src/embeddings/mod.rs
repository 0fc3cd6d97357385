//! Embeddings generation module
//!
//! Text embeddings come from an OpenAI-compatible or Ollama endpoint and are
//! cached locally (one JSON file per text hash) and optionally in Redis.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hybrid_chat::config::AppConfig;
//! use hybrid_chat::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.generate("romantic beach towns").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod generator;

use async_trait::async_trait;
pub use cache::get_text_hash;
pub use cache::EmbeddingCache;
pub use cache::FileEmbeddingCache;
pub use cache::RedisEmbeddingCache;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use generator::RetryPolicy;

use crate::errors::Result;

/// Turns text into a dense vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Raw provider access used underneath the cache
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub concurrency: usize,
    pub batch_size: usize,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        let embeddings = &config.embeddings;
        let provider = EmbeddingProvider::from_name(&embeddings.provider);

        Self {
            provider,
            model: embeddings.model.clone(),
            dimension: embeddings.dimension,
            endpoint: embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: if embeddings.api_key.is_empty() {
                None
            } else {
                Some(embeddings.api_key.clone())
            },
            concurrency: embeddings.concurrency.max(1),
            batch_size: embeddings.batch_size.max(1),
        }
    }
}
