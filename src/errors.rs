use thiserror::Error;

#[derive(Error, Debug)]
pub enum HybridChatError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Vector search error: {0}")]
    VectorSearchError(String),

    #[error("Graph error: {0}")]
    GraphError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<reqwest::Error> for HybridChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<redis::RedisError> for HybridChatError {
    fn from(err: redis::RedisError) -> Self {
        Self::CacheError(err.to_string())
    }
}

impl HybridChatError {
    /// Whether the failure came from an external collaborator (network, auth,
    /// remote service) rather than from local configuration or IO.
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_)
                | Self::EmbeddingError(_)
                | Self::VectorSearchError(_)
                | Self::GraphError(_)
                | Self::LlmError(_)
                | Self::CacheError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HybridChatError>;
