//! Dataset ingest into the vector index and the knowledge graph

use std::path::Path;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::embeddings::EmbeddingBackend;
use crate::errors::HybridChatError;
use crate::errors::Result;
use crate::graph::GraphStore;
use crate::graph::DEFAULT_RELATION;
use crate::models::DatasetNode;
use crate::models::MatchMetadata;
use crate::text::truncate_chars;
use crate::vector::VectorIndex;
use crate::vector::VectorRecord;

/// Texts embedded and upserted per request
pub const UPLOAD_BATCH_SIZE: usize = 32;

/// Pause between upload batches
pub const BATCH_PAUSE: Duration = Duration::from_millis(200);

/// Description prefix used when a node has no `semantic_text`
pub const MAX_SEMANTIC_CHARS: usize = 1000;

/// One node prepared for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct VectorItem {
    pub id: String,
    pub text: String,
    pub metadata: MatchMetadata,
}

/// Counters reported after an ingest run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestStats {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f64 / self.total as f64) * 100.0
        }
    }
}

/// Read a JSON array of dataset nodes
///
/// # Errors
/// - File read errors
/// - Malformed JSON
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<DatasetNode>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let nodes: Vec<DatasetNode> = serde_json::from_str(&content).map_err(|e| {
        HybridChatError::Custom(format!("Invalid dataset {}: {e}", path.display()))
    })?;
    info!("Loaded {} nodes from {}", nodes.len(), path.display());
    Ok(nodes)
}

/// Text to embed for a node: `semantic_text`, else the start of `description`
#[must_use]
pub fn semantic_text(node: &DatasetNode) -> Option<String> {
    let text = match node.semantic_text.as_deref().filter(|s| !s.is_empty()) {
        Some(text) => text.to_string(),
        None => truncate_chars(node.description.as_deref().unwrap_or_default(), MAX_SEMANTIC_CHARS)
            .to_string(),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Build embedding inputs, skipping nodes with no usable text
#[must_use]
pub fn prepare_vector_items(nodes: &[DatasetNode]) -> Vec<VectorItem> {
    nodes
        .iter()
        .filter_map(|node| {
            let text = semantic_text(node)?;
            Some(VectorItem {
                id: node.id.clone(),
                text,
                metadata: MatchMetadata {
                    name: node.name.clone().unwrap_or_default(),
                    entity_type: node.node_type.clone().unwrap_or_default(),
                    tags: node.tags.clone(),
                    city: node
                        .city
                        .clone()
                        .or_else(|| node.region.clone())
                        .unwrap_or_default(),
                },
            })
        })
        .collect()
}

/// Embed and upsert items in fixed-size batches
///
/// # Errors
/// - Embedding errors
/// - Vector index errors
pub async fn upload_vectors(
    items: &[VectorItem],
    embedder: &dyn EmbeddingBackend,
    index: &dyn VectorIndex,
    pause: Duration,
) -> Result<IngestStats> {
    let mut stats = IngestStats {
        total: items.len(),
        ..Default::default()
    };
    let batches = items.len().div_ceil(UPLOAD_BATCH_SIZE);
    info!("Uploading {} items in {} batches", items.len(), batches);

    for (n, batch) in items.chunks(UPLOAD_BATCH_SIZE).enumerate() {
        let texts: Vec<String> = batch.iter().map(|item| item.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(HybridChatError::EmbeddingError(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }

        let records: Vec<VectorRecord> = batch
            .iter()
            .zip(embeddings)
            .map(|(item, values)| VectorRecord {
                id: item.id.clone(),
                values,
                metadata: item.metadata.clone(),
            })
            .collect();

        index.upsert(&records).await?;
        stats.processed += records.len();
        debug!("Batch {}/{} uploaded", n + 1, batches);

        if n + 1 < batches && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    Ok(stats)
}

/// Create constraints, merge all nodes, then merge declared connections.
///
/// Connections missing a relation or target are skipped. A failing node or
/// relationship is logged and counted; the load continues.
///
/// # Errors
/// - Constraint creation errors
pub async fn load_graph(nodes: &[DatasetNode], graph: &dyn GraphStore) -> Result<IngestStats> {
    graph.create_constraints().await?;

    let mut stats = IngestStats {
        total: nodes.len(),
        ..Default::default()
    };

    for node in nodes {
        match graph.upsert_node(node).await {
            Ok(()) => stats.processed += 1,
            Err(e) => {
                warn!("Failed to upsert node {}: {}", node.id, e);
                stats.failed += 1;
            }
        }
    }

    let mut relationships = 0usize;
    for node in nodes {
        for conn in &node.connections {
            let Some(target) = conn.target.as_deref() else {
                stats.skipped += 1;
                continue;
            };
            let relation = conn.relation.as_deref().unwrap_or(DEFAULT_RELATION);
            match graph.create_relationship(&node.id, relation, target).await {
                Ok(()) => relationships += 1,
                Err(e) => {
                    warn!("Failed to link {} -[{}]-> {}: {}", node.id, relation, target, e);
                    stats.failed += 1;
                }
            }
        }
    }

    info!(
        "Graph load done: {} nodes, {} relationships, {} skipped, {} failed",
        stats.processed, relationships, stats.skipped, stats.failed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::Connection;
    use crate::models::GraphFact;
    use crate::models::Match;

    fn node(id: &str) -> DatasetNode {
        serde_json::from_value(serde_json::json!({ "id": id })).unwrap()
    }

    struct LenEmbedder;

    #[async_trait]
    impl EmbeddingBackend for LenEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        batches: Mutex<Vec<Vec<VectorRecord>>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<Match>> {
            Ok(Vec::new())
        }

        async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingGraph {
        nodes: Mutex<Vec<String>>,
        edges: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl GraphStore for RecordingGraph {
        async fn expand(&self, _ids: &[String]) -> Result<Vec<GraphFact>> {
            Ok(Vec::new())
        }

        async fn create_constraints(&self) -> Result<()> {
            Ok(())
        }

        async fn upsert_node(&self, node: &DatasetNode) -> Result<()> {
            if node.id == "bad" {
                return Err(HybridChatError::GraphError("boom".to_string()));
            }
            self.nodes.lock().unwrap().push(node.id.clone());
            Ok(())
        }

        async fn create_relationship(&self, source: &str, relation: &str, target: &str) -> Result<()> {
            self.edges
                .lock()
                .unwrap()
                .push((source.to_string(), relation.to_string(), target.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_semantic_text_prefers_explicit_field() {
        let mut n = node("a");
        n.semantic_text = Some("romantic hill town".to_string());
        n.description = Some("ignored".to_string());
        assert_eq!(semantic_text(&n).as_deref(), Some("romantic hill town"));
    }

    #[test]
    fn test_semantic_text_falls_back_to_description_prefix() {
        let mut n = node("a");
        n.description = Some("x".repeat(1500));
        assert_eq!(semantic_text(&n).unwrap().len(), MAX_SEMANTIC_CHARS);
    }

    #[test]
    fn test_prepare_skips_blank_nodes_and_fills_metadata() {
        let mut city = node("city_da_lat");
        city.node_type = Some("City".to_string());
        city.name = Some("Da Lat".to_string());
        city.region = Some("Central Highlands".to_string());
        city.tags = vec!["romantic".to_string()];
        city.description = Some("Cool climate".to_string());

        let mut blank = node("blank");
        blank.description = Some("   ".to_string());

        let items = prepare_vector_items(&[city, blank, node("empty")]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "city_da_lat");
        assert_eq!(items[0].metadata.city, "Central Highlands");
        assert_eq!(items[0].metadata.entity_type, "City");
        assert_eq!(items[0].metadata.tags, vec!["romantic"]);
    }

    #[tokio::test]
    async fn test_upload_batches_of_32() {
        let items: Vec<VectorItem> = (0..70)
            .map(|i| VectorItem {
                id: format!("n{i}"),
                text: "abc".to_string(),
                metadata: MatchMetadata::default(),
            })
            .collect();
        let index = RecordingIndex::default();

        let stats = upload_vectors(&items, &LenEmbedder, &index, Duration::ZERO)
            .await
            .unwrap();

        let sizes: Vec<usize> = index.batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![32, 32, 6]);
        assert_eq!(stats.processed, 70);
        assert_eq!(index.batches.lock().unwrap()[2][5].id, "n69");
        assert_eq!(index.batches.lock().unwrap()[0][0].values, vec![3.0]);
    }

    #[tokio::test]
    async fn test_load_graph_merges_nodes_then_edges() {
        let mut a = node("a");
        a.connections = vec![
            Connection {
                relation: Some("NEAR".to_string()),
                target: Some("b".to_string()),
            },
            Connection {
                relation: None,
                target: Some("b".to_string()),
            },
            Connection {
                relation: Some("NEAR".to_string()),
                target: None,
            },
        ];
        let graph = RecordingGraph::default();

        let stats = load_graph(&[a, node("b"), node("bad")], &graph).await.unwrap();

        assert_eq!(*graph.nodes.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(
            *graph.edges.lock().unwrap(),
            vec![
                ("a".to_string(), "NEAR".to_string(), "b".to_string()),
                ("a".to_string(), "RELATED_TO".to_string(), "b".to_string()),
            ]
        );
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_load_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"[{"id": "a", "type": "City"}, {"id": "b"}]"#).unwrap();

        let nodes = load_dataset(&path).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(load_dataset(dir.path().join("missing.json")).is_err());
    }
}
