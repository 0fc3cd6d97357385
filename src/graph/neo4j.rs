//! Neo4j access over the HTTP transactional Cypher endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::facts_from_records;
use super::GraphStore;
use super::NeighborRecord;
use super::DEFAULT_RELATION;
use super::MAX_ROWS;
use crate::config::GraphConfig;
use crate::errors::HybridChatError;
use crate::errors::Result;
use crate::models::DatasetNode;
use crate::models::GraphFact;

const BOLT_PORT: u16 = 7687;
const HTTP_PORT: u16 = 7474;
const HTTPS_PORT: u16 = 7473;

/// Resolve a configured Neo4j URI to the base of its HTTP API.
///
/// `bolt://` and `neo4j://` map to `http`, their `+s`/`+ssc` variants to
/// `https`. A missing or default Bolt port becomes the matching HTTP port;
/// any other explicit port is kept.
pub(crate) fn http_base(uri: &str) -> Result<String> {
    let uri = uri.trim();
    let parsed = Url::parse(uri)
        .map_err(|e| HybridChatError::ConfigError(format!("Invalid Neo4j URI '{uri}': {e}")))?;

    let (scheme, default_port) = match parsed.scheme() {
        "http" | "https" => return Ok(uri.trim_end_matches('/').to_string()),
        "bolt" | "neo4j" => ("http", HTTP_PORT),
        "bolt+s" | "bolt+ssc" | "neo4j+s" | "neo4j+ssc" => ("https", HTTPS_PORT),
        other => {
            return Err(HybridChatError::ConfigError(format!(
                "Unsupported Neo4j URI scheme '{other}'"
            )))
        }
    };

    let host = parsed
        .host()
        .ok_or_else(|| HybridChatError::ConfigError(format!("Neo4j URI '{uri}' has no host")))?;
    let port = match parsed.port() {
        None | Some(BOLT_PORT) => default_port,
        Some(port) => port,
    };
    Ok(format!("{scheme}://{host}:{port}"))
}

fn expand_query() -> String {
    format!(
        "UNWIND $node_ids AS nid \
         MATCH (n:Entity {{id: nid}})-[r]-(m:Entity) \
         OPTIONAL MATCH (m)-[r2]-(o:Entity) WHERE o <> n \
         RETURN type(r) AS rel, labels(m) AS labels, m.id AS id, \
         m.name AS name, m.description AS description, \
         type(r2) AS rel2, labels(o) AS labels2, o.id AS id2, \
         o.name AS name2, o.description AS description2 \
         LIMIT {MAX_ROWS}"
    )
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Parse a transactional endpoint response into neighbour records
pub(crate) fn parse_expand_response(body: &str) -> Result<Vec<NeighborRecord>> {
    let response: TxResponse = serde_json::from_str(body)
        .map_err(|e| HybridChatError::GraphError(format!("Failed to parse response: {e}")))?;

    if let Some(err) = response.errors.first() {
        return Err(HybridChatError::GraphError(format!(
            "{}: {}",
            err.code, err.message
        )));
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    let col = |name: &str| result.columns.iter().position(|c| c == name);
    let (rel, labels, id, name, description) = (
        col("rel"),
        col("labels"),
        col("id"),
        col("name"),
        col("description"),
    );
    let (rel2, labels2, id2, name2, description2) = (
        col("rel2"),
        col("labels2"),
        col("id2"),
        col("name2"),
        col("description2"),
    );

    let records = result
        .data
        .iter()
        .filter_map(|data| {
            let row = &data.row;
            let text = |idx: Option<usize>| {
                idx.and_then(|i| row.get(i))
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
            };
            let list = |idx: Option<usize>| {
                idx.and_then(|i| row.get(i))
                    .and_then(Value::as_array)
                    .map(|values| {
                        values
                            .iter()
                            .filter_map(Value::as_str)
                            .map(ToString::to_string)
                            .collect()
                    })
                    .unwrap_or_default()
            };

            // Rows without a neighbour id are unusable
            Some(NeighborRecord {
                rel: text(rel).unwrap_or_default(),
                labels: list(labels),
                id: text(id)?,
                name: text(name),
                description: text(description),
                rel2: text(rel2),
                labels2: list(labels2),
                id2: text(id2),
                name2: text(name2),
                description2: text(description2),
            })
        })
        .collect();

    Ok(records)
}

/// Keep a relationship type safe to splice into Cypher
fn sanitize_relation(relation: &str) -> String {
    let cleaned: String = relation
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('_').is_empty() {
        DEFAULT_RELATION.to_string()
    } else {
        cleaned
    }
}

/// Label list for a dataset node: its type (sanitized) plus `Entity`
fn node_labels(node: &DatasetNode) -> String {
    let node_type: String = node
        .node_type
        .as_deref()
        .unwrap_or("Unknown")
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let node_type = if node_type.is_empty() {
        "Unknown".to_string()
    } else {
        node_type
    };
    format!(":{node_type}:Entity")
}

/// Neo4j graph store client
pub struct Neo4jGraph {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
}

impl Neo4jGraph {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        let base = http_base(&config.uri)?;
        debug!("Neo4j HTTP endpoint: {}", base);

        Ok(Self {
            client,
            endpoint: format!("{}/db/{}/tx/commit", base, config.database),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Run a single statement in an auto-commit transaction
    async fn run(&self, statement: &str, parameters: Value) -> Result<String> {
        let body = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;
        if !status.is_success() {
            return Err(HybridChatError::GraphError(format!(
                "Neo4j API error ({status}): {text}"
            )));
        }
        Ok(text)
    }

    /// Run a statement and fail on any Cypher error in the body
    async fn execute(&self, statement: &str, parameters: Value) -> Result<()> {
        let body = self.run(statement, parameters).await?;
        parse_expand_response(&body).map(|_| ())
    }
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn expand(&self, ids: &[String]) -> Result<Vec<GraphFact>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let body = self
            .run(&expand_query(), json!({ "node_ids": ids }))
            .await?;
        let records = parse_expand_response(&body)?;
        let facts = facts_from_records(records);
        debug!("Graph expansion of {} ids produced {} facts", ids.len(), facts.len());
        Ok(facts)
    }

    async fn create_constraints(&self) -> Result<()> {
        self.execute(
            "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Entity) REQUIRE n.id IS UNIQUE",
            json!({}),
        )
        .await
    }

    async fn upsert_node(&self, node: &DatasetNode) -> Result<()> {
        let mut props = serde_json::to_value(node)?;
        if let Value::Object(map) = &mut props {
            map.remove("connections");
            // Neo4j properties can't hold nulls
            map.retain(|_, v| !v.is_null());
        }

        let statement = format!("MERGE (n{} {{id: $id}}) SET n += $props", node_labels(node));
        self.execute(&statement, json!({ "id": node.id, "props": props }))
            .await
    }

    async fn create_relationship(
        &self,
        source_id: &str,
        relation: &str,
        target_id: &str,
    ) -> Result<()> {
        let statement = format!(
            "MATCH (a:Entity {{id: $source_id}}), (b:Entity {{id: $target_id}}) \
             MERGE (a)-[r:{}]->(b) RETURN r",
            sanitize_relation(relation)
        );
        self.execute(
            &statement,
            json!({ "source_id": source_id, "target_id": target_id }),
        )
        .await
    }
}
