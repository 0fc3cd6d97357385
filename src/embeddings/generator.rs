//! Embedding generation service with caching, retries and batch processing

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::cache::get_text_hash;
use super::cache::EmbeddingCache;
use super::cache::FileEmbeddingCache;
use super::cache::RedisEmbeddingCache;
use super::client::EmbeddingClient;
use super::Embedder;
use super::EmbeddingBackend;
use super::EmbeddingConfig;
use crate::errors::HybridChatError;
use crate::errors::Result;

/// Exponential backoff for provider calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.min_delay
            .saturating_mul(factor)
            .clamp(self.min_delay, self.max_delay)
    }

    /// No waiting between attempts
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// An empty vector from the provider is an error, never a cacheable result
fn reject_empty(embeddings: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
    if embeddings.iter().any(Vec::is_empty) {
        return Err(HybridChatError::EmbeddingError(
            "Provider returned an empty embedding".to_string(),
        ));
    }
    Ok(embeddings)
}

/// Service for generating embeddings with caching and optimization
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
    cache: EmbeddingCache,
    model: String,
    batch_size: usize,
    semaphore: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl EmbeddingService {
    /// Create a new embedding service from application config
    ///
    /// # Errors
    /// - HTTP client build errors
    /// - Cache directory creation errors
    /// - Invalid Redis URL
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let embedding_config = EmbeddingConfig::from_app_config(config);
        let client = EmbeddingClient::new(
            embedding_config.provider,
            embedding_config.model.clone(),
            embedding_config.endpoint.clone(),
            embedding_config.api_key.clone(),
        )?;

        let mut cache =
            EmbeddingCache::disabled().with_file(FileEmbeddingCache::new(&config.embeddings.cache_dir)?);
        if let Some(url) = config.embedding_redis_url() {
            info!("Remote embedding cache enabled");
            cache = cache.with_remote(RedisEmbeddingCache::connect(
                url,
                Duration::from_secs(config.embeddings.cache_ttl_secs),
            )?);
        }

        Ok(Self::from_backend(Arc::new(client), cache, &embedding_config))
    }

    /// Create from an arbitrary backend and cache
    pub fn from_backend(
        backend: Arc<dyn EmbeddingBackend>,
        cache: EmbeddingCache,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            backend,
            cache,
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn cache_key(&self, text: &str) -> String {
        get_text_hash(text, Some(&self.model))
    }

    /// Call the provider with bounded concurrency and retries
    async fn fetch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| HybridChatError::EmbeddingError(format!("Semaphore closed: {e}")))?;

        let mut attempt = 1;
        loop {
            match self.backend.embed_batch(texts).await {
                Ok(embeddings) => return reject_empty(embeddings),
                Err(e) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Embedding request failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt, self.retry.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Generate embedding for a single text, consulting the caches first
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let key = self.cache_key(text);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let embedding = self
            .fetch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HybridChatError::EmbeddingError("No embedding returned".to_string()))?;

        self.cache.put(&key, &embedding).await;
        Ok(embedding)
    }

    /// Generate embeddings for multiple texts, returned in input order
    pub async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut uncached: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(&self.cache_key(text)).await {
                Some(cached) => results[i] = Some(cached),
                None => uncached.push(i),
            }
        }

        debug!(
            "Embedding batch: {} cached, {} to fetch",
            texts.len() - uncached.len(),
            uncached.len()
        );

        for chunk in uncached.chunks(self.batch_size) {
            let batch: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let embeddings = self.fetch(&batch).await?;
            if embeddings.len() != batch.len() {
                return Err(HybridChatError::EmbeddingError(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            for (&i, embedding) in chunk.iter().zip(embeddings) {
                self.cache.put(&self.cache_key(&texts[i]), &embedding).await;
                results[i] = Some(embedding);
            }
        }

        results
            .into_iter()
            .map(|r| {
                r.ok_or_else(|| HybridChatError::EmbeddingError("Missing embedding".to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate(text).await
    }
}

#[async_trait]
impl EmbeddingBackend for EmbeddingService {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_batch(texts).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::embeddings::EmbeddingProvider;

    /// Embeds each text as `[len]` and counts calls; fails the first `fail_first` calls
    struct CountingBackend {
        calls: AtomicUsize,
        texts_seen: AtomicUsize,
        fail_first: usize,
    }

    impl CountingBackend {
        fn new(fail_first: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                texts_seen: AtomicUsize::new(0),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl EmbeddingBackend for CountingBackend {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(HybridChatError::HttpError("connection reset".to_string()));
            }
            self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    /// Answers every text with an empty vector, like Ollama with an unknown model
    struct EmptyBackend;

    #[async_trait]
    impl EmbeddingBackend for EmptyBackend {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| Vec::new()).collect())
        }
    }

    fn test_config(batch_size: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: EmbeddingProvider::OpenAI,
            model: "test-model".to_string(),
            dimension: 1,
            endpoint: "http://localhost".to_string(),
            api_key: None,
            concurrency: 2,
            batch_size,
        }
    }

    fn service_with(
        backend: Arc<dyn EmbeddingBackend>,
        cache: EmbeddingCache,
        batch_size: usize,
    ) -> EmbeddingService {
        EmbeddingService::from_backend(backend, cache, &test_config(batch_size))
            .with_retry_policy(RetryPolicy::immediate(3))
    }

    #[test]
    fn test_retry_delay_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_generate_uses_file_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            EmbeddingCache::disabled().with_file(FileEmbeddingCache::new(dir.path()).unwrap());
        let backend = Arc::new(CountingBackend::new(0));
        let service = service_with(backend.clone(), cache, 32);

        let first = service.generate("hanoi").await.unwrap();
        let second = service.generate("hanoi").await.unwrap();

        assert_eq!(first, vec![5.0]);
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_without_cache_calls_backend_each_time() {
        let backend = Arc::new(CountingBackend::new(0));
        let service = service_with(backend.clone(), EmbeddingCache::disabled(), 32);

        service.generate("a").await.unwrap();
        service.generate("a").await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_generate_retries_transient_failures() {
        let backend = Arc::new(CountingBackend::new(2));
        let service = service_with(backend.clone(), EmbeddingCache::disabled(), 32);

        let embedding = service.generate("abc").await.unwrap();
        assert_eq!(embedding, vec![3.0]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_max_attempts() {
        let backend = Arc::new(CountingBackend::new(5));
        let service = service_with(backend.clone(), EmbeddingCache::disabled(), 32);

        let err = service.generate("abc").await.unwrap_err();
        assert!(matches!(err, HybridChatError::HttpError(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_generate_batch_preserves_order_and_skips_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            EmbeddingCache::disabled().with_file(FileEmbeddingCache::new(dir.path()).unwrap());
        let backend = Arc::new(CountingBackend::new(0));
        let service = service_with(backend.clone(), cache, 2);

        service.generate("bb").await.unwrap();

        let texts: Vec<String> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let embeddings = service.generate_batch(&texts).await.unwrap();

        assert_eq!(
            embeddings,
            vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0]]
        );
        // one call for "bb", then 4 uncached texts in batches of 2
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert_eq!(backend.texts_seen.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_empty_provider_embedding_is_error_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache =
            EmbeddingCache::disabled().with_file(FileEmbeddingCache::new(dir.path()).unwrap());
        let service = service_with(Arc::new(EmptyBackend), cache, 32);

        let err = service.generate("hanoi").await.unwrap_err();
        assert!(matches!(err, HybridChatError::EmbeddingError(_)));

        let texts = vec!["hue".to_string(), "da nang".to_string()];
        let err = service.generate_batch(&texts).await.unwrap_err();
        assert!(matches!(err, HybridChatError::EmbeddingError(_)));

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_generate_batch_empty() {
        let backend = Arc::new(CountingBackend::new(0));
        let service = service_with(backend.clone(), EmbeddingCache::disabled(), 2);
        assert!(service.generate_batch(&[]).await.unwrap().is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
