//! Pinecone REST client (data plane query/upsert, control plane index management)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing::info;

use super::rank_matches;
use super::VectorIndex;
use super::VectorRecord;
use crate::config::VectorConfig;
use crate::errors::HybridChatError;
use crate::errors::Result;
use crate::models::Match;

const API_VERSION: &str = "2024-07";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: Option<String>,
}

/// Parse a Pinecone query response into ranked matches
pub(crate) fn parse_query_response(body: &str, top_k: usize) -> Result<Vec<Match>> {
    let response: QueryResponse = serde_json::from_str(body).map_err(|e| {
        HybridChatError::VectorSearchError(format!("Failed to parse query response: {e}"))
    })?;
    Ok(rank_matches(response.matches, top_k))
}

/// Prefix a bare host with https://
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// A Pinecone index bound to its data-plane host
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    host: String,
}

impl PineconeIndex {
    /// Connect to the configured index, discovering its host via the control
    /// plane when `index_host` is not set.
    pub async fn connect(config: &VectorConfig) -> Result<Self> {
        let client = build_client()?;
        let host = if config.index_host.trim().is_empty() {
            describe_index_host(&client, config).await?
        } else {
            normalize_host(&config.index_host)
        };
        debug!("Using Pinecone index host {}", host);

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            host,
        })
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<String> {
        let url = format!("{}{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;
        if !status.is_success() {
            return Err(HybridChatError::VectorSearchError(format!(
                "Pinecone API error ({status}): {text}"
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let body = self.post("/query", &request).await?;
        let matches = parse_query_response(&body, top_k)?;
        debug!("Pinecone returned {} matches", matches.len());
        Ok(matches)
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.post("/vectors/upsert", &json!({ "vectors": records }))
            .await?;
        debug!("Upserted {} vectors", records.len());
        Ok(())
    }
}

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| HybridChatError::HttpError(e.to_string()))
}

async fn list_indexes(client: &Client, config: &VectorConfig) -> Result<Vec<IndexDescription>> {
    let url = format!("{}/indexes", config.control_plane.trim_end_matches('/'));
    let response = client
        .get(&url)
        .header("Api-Key", &config.api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(HybridChatError::VectorSearchError(format!(
            "Failed to list indexes ({status}): {text}"
        )));
    }

    let list: IndexList = response.json().await.map_err(|e| {
        HybridChatError::VectorSearchError(format!("Failed to parse index list: {e}"))
    })?;
    Ok(list.indexes)
}

async fn describe_index_host(client: &Client, config: &VectorConfig) -> Result<String> {
    list_indexes(client, config)
        .await?
        .into_iter()
        .find(|index| index.name == config.index_name)
        .and_then(|index| index.host)
        .map(|host| normalize_host(&host))
        .ok_or_else(|| {
            HybridChatError::VectorSearchError(format!(
                "Index '{}' not found or has no host yet",
                config.index_name
            ))
        })
}

/// Create the configured serverless cosine index if it doesn't exist yet
pub async fn create_index_if_not_exists(config: &VectorConfig) -> Result<bool> {
    let client = build_client()?;
    let exists = list_indexes(&client, config)
        .await?
        .iter()
        .any(|index| index.name == config.index_name);
    if exists {
        return Ok(false);
    }

    info!("Creating managed index: {}", config.index_name);
    let url = format!("{}/indexes", config.control_plane.trim_end_matches('/'));
    let body = json!({
        "name": config.index_name,
        "dimension": config.dimension,
        "metric": "cosine",
        "spec": { "serverless": { "cloud": config.cloud, "region": config.region } },
    });

    let response = client
        .post(&url)
        .header("Api-Key", &config.api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .json(&body)
        .send()
        .await
        .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(HybridChatError::VectorSearchError(format!(
            "Index creation failed ({status}): {text}"
        )));
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_response() {
        let body = r#"{
            "matches": [
                {"id": "attr_1", "score": 0.71, "metadata": {"name": "My Khe Beach", "type": "Attraction", "tags": ["beach"], "city": "Da Nang"}},
                {"id": "city_hoi_an", "score": 0.88, "metadata": {"name": "Hoi An", "type": "City", "tags": ["heritage", "culture"]}}
            ],
            "namespace": ""
        }"#;
        let matches = parse_query_response(body, 10).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "city_hoi_an");
        assert_eq!(matches[1].metadata.city, "Da Nang");
    }

    #[test]
    fn test_parse_query_response_without_matches() {
        let matches = parse_query_response("{}", 10).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_parse_query_response_malformed() {
        let err = parse_query_response("not json", 10).unwrap_err();
        assert!(matches!(err, HybridChatError::VectorSearchError(_)));
    }

    #[test]
    fn test_query_request_uses_camel_case() {
        let vector = [0.1_f32, 0.2];
        let request = QueryRequest {
            vector: &vector,
            top_k: 10,
            include_metadata: true,
            include_values: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["topK"], 10);
        assert_eq!(value["includeMetadata"], true);
        assert_eq!(value["includeValues"], false);
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("idx-abc.svc.pinecone.io"),
            "https://idx-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }
}
