use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// `openai` or `ollama`
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Optional Redis URL for the remote embedding cache (empty disables it)
    #[serde(default)]
    pub redis_url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

pub(crate) const fn default_dimension() -> usize {
    1536
}

fn default_cache_dir() -> String {
    "cache".to_string()
}

pub(crate) const fn default_cache_ttl_secs() -> u64 {
    86400
}

pub(crate) const fn default_concurrency() -> usize {
    8
}

pub(crate) const fn default_batch_size() -> usize {
    32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// Data-plane host of the index; discovered from the control plane when empty
    #[serde(default)]
    pub index_host: String,
    #[serde(default = "default_control_plane")]
    pub control_plane: String,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_index_name() -> String {
    "vietnam-travel".to_string()
}

fn default_control_plane() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

pub(crate) const fn default_top_k() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_neo4j_uri")]
    pub uri: String,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_neo4j_database")]
    pub database: String,
}

fn default_neo4j_uri() -> String {
    "http://localhost:7474".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_neo4j_database() -> String {
    "neo4j".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_openai_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_temperature() -> f32 {
    0.2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_retry_max_tokens")]
    pub retry_max_tokens: u32,
    #[serde(default = "default_template")]
    pub default_template: String,
}

pub(crate) const fn default_max_tokens() -> u32 {
    1100
}

pub(crate) const fn default_retry_max_tokens() -> u32 {
    1200
}

fn default_template() -> String {
    "concise".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            retry_max_tokens: default_retry_max_tokens(),
            default_template: default_template(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub vector: VectorConfig,
    pub graph: GraphConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from the default file locations, then apply
    /// environment overrides.
    pub fn load() -> crate::Result<Self> {
        // Try config.toml first, then config.example.toml, then built-in defaults
        let mut config = if Path::new("config.toml").exists() {
            Self::from_file("config.toml")?
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")?
        } else {
            tracing::warn!("No config file found, using built-in defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path (if given) and apply environment overrides
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => {
                let mut config = Self::from_file(path)?;
                config.apply_env_overrides(|key| std::env::var(key).ok());
                Ok(config)
            }
            None => Self::load(),
        }
    }

    /// Override secrets and endpoints from the environment.
    ///
    /// The lookup is injected so tests don't have to mutate process state.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            if self.embeddings.api_key.is_empty() {
                self.embeddings.api_key = key.clone();
            }
            if self.llm.llm_key.is_empty() {
                self.llm.llm_key = key;
            }
        }
        if let Some(key) = get("PINECONE_API_KEY") {
            self.vector.api_key = key;
        }
        if let Some(region) = get("PINECONE_ENV") {
            self.vector.region = region;
        }
        if let Some(name) = get("PINECONE_INDEX_NAME") {
            self.vector.index_name = name;
        }
        if let Some(host) = get("PINECONE_INDEX_HOST") {
            self.vector.index_host = host;
        }
        if let Some(dim) = get("PINECONE_VECTOR_DIM").and_then(|d| d.parse().ok()) {
            self.vector.dimension = dim;
        }
        if let Some(uri) = get("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = get("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = get("NEO4J_PASSWORD") {
            self.graph.password = password;
        }
        if let Some(url) = get("EMBEDDING_REDIS_URL") {
            self.embeddings.redis_url = url;
        }
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get the Redis URL for the remote embedding cache, if enabled
    pub fn embedding_redis_url(&self) -> Option<&str> {
        let url = self.embeddings.redis_url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }

    /// Get default top-k for vector queries
    pub fn top_k(&self) -> usize {
        self.vector.top_k
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM key
    pub fn llm_key(&self) -> &str {
        &self.llm.llm_key
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get Neo4j HTTP URI
    pub fn neo4j_uri(&self) -> &str {
        &self.graph.uri
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                dir: default_log_dir(),
            },
            embeddings: EmbeddingsConfig {
                provider: default_embedding_provider(),
                endpoint: default_openai_endpoint(),
                api_key: String::new(),
                model: default_embedding_model(),
                dimension: default_dimension(),
                cache_dir: default_cache_dir(),
                redis_url: String::new(),
                cache_ttl_secs: default_cache_ttl_secs(),
                concurrency: default_concurrency(),
                batch_size: default_batch_size(),
            },
            vector: VectorConfig {
                api_key: String::new(),
                index_name: default_index_name(),
                index_host: String::new(),
                control_plane: default_control_plane(),
                cloud: default_cloud(),
                region: default_region(),
                dimension: default_dimension(),
                top_k: default_top_k(),
            },
            graph: GraphConfig {
                uri: default_neo4j_uri(),
                user: default_neo4j_user(),
                password: String::new(),
                database: default_neo4j_database(),
            },
            llm: LlmConfig {
                llm_endpoint: default_openai_endpoint(),
                llm_key: String::new(),
                llm_model: default_llm_model(),
                temperature: default_temperature(),
            },
            pipeline: PipelineConfig::default(),
        }
    }
}
