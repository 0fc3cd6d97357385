//! Embedding caches keyed by a hash of model + text
//!
//! The file cache stores one JSON array per key. The Redis cache is optional
//! and best-effort: any Redis failure is logged and read as a miss.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use sha2::Digest;
use sha2::Sha256;
use tracing::debug;
use tracing::warn;

use crate::errors::HybridChatError;
use crate::errors::Result;

/// Return a stable SHA-256 key for a text, optionally namespaced by model
#[must_use]
pub fn get_text_hash(text: &str, model: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    if let Some(model) = model {
        hasher.update(model.as_bytes());
        hasher.update(b":");
    }
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Directory of `{hash}.json` embedding files
#[derive(Debug, Clone)]
pub struct FileEmbeddingCache {
    dir: PathBuf,
}

impl FileEmbeddingCache {
    /// Open (and create if needed) a cache directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Return the cached embedding, or `None` if missing or corrupt
    pub fn load(&self, key: &str) -> Option<Vec<f32>> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed reading cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!("Failed parsing cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Atomically write an embedding (temp file in the same dir, then rename)
    pub fn save(&self, key: &str, embedding: &[f32]) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(tmp.as_file_mut(), embedding)?;
        tmp.persist(self.path_for(key))
            .map_err(|e| HybridChatError::Io(e.error))?;
        Ok(())
    }
}

/// Remote embedding cache in Redis with a TTL
#[derive(Clone)]
pub struct RedisEmbeddingCache {
    client: redis::Client,
    ttl: Duration,
}

impl RedisEmbeddingCache {
    pub fn connect(url: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| HybridChatError::CacheError(format!("Redis open error: {e}")))?;
        Ok(Self { client, ttl })
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<f32>>> {
        let mut conn = self.client.get_multiplexed_tokio_connection().await?;
        let raw: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, embedding: &[f32]) -> Result<()> {
        let json = serde_json::to_string(embedding)?;
        let mut conn = self.client.get_multiplexed_tokio_connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(json)
            .arg("EX")
            .arg(self.ttl.as_secs())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Two-level cache: local files first, then Redis
#[derive(Clone, Default)]
pub struct EmbeddingCache {
    file: Option<FileEmbeddingCache>,
    remote: Option<RedisEmbeddingCache>,
}

impl EmbeddingCache {
    /// A cache that never hits and never stores
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, file: FileEmbeddingCache) -> Self {
        self.file = Some(file);
        self
    }

    #[must_use]
    pub fn with_remote(mut self, remote: RedisEmbeddingCache) -> Self {
        self.remote = Some(remote);
        self
    }

    pub const fn is_enabled(&self) -> bool {
        self.file.is_some() || self.remote.is_some()
    }

    pub async fn get(&self, key: &str) -> Option<Vec<f32>> {
        if let Some(file) = &self.file {
            let file = file.clone();
            let owned_key = key.to_string();
            // File IO runs off the async workers
            match tokio::task::spawn_blocking(move || file.load(&owned_key)).await {
                Ok(Some(embedding)) => {
                    debug!("Embedding file cache hit: {}", key);
                    return Some(embedding);
                }
                Ok(None) => {}
                Err(e) => warn!("File cache read task failed: {}", e),
            }
        }

        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(Some(embedding)) => {
                    debug!("Embedding Redis cache hit: {}", key);
                    return Some(embedding);
                }
                Ok(None) => {}
                Err(e) => warn!("Redis cache read failed: {}", e),
            }
        }

        None
    }

    pub async fn put(&self, key: &str, embedding: &[f32]) {
        if let Some(file) = &self.file {
            let file = file.clone();
            let owned_key = key.to_string();
            let owned = embedding.to_vec();
            match tokio::task::spawn_blocking(move || file.save(&owned_key, &owned)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("File cache write failed: {}", e),
                Err(e) => warn!("File cache write task failed: {}", e),
            }
        }

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.set(key, embedding).await {
                warn!("Redis cache write failed: {}", e);
            }
        }
    }
}
