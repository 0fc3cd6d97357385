//! Knowledge-graph expansion of vector matches
//!
//! Seeds from the vector search are expanded one and two hops through the
//! entity graph. Each neighbour row becomes a 1-hop [`GraphFact`], followed
//! immediately by its 2-hop fact when the row carries one.

pub mod neo4j;

use async_trait::async_trait;
pub use neo4j::Neo4jGraph;

use crate::errors::Result;
use crate::models::DatasetNode;
use crate::models::GraphFact;
use crate::text::truncate_chars;

/// Maximum number of facts returned by one expansion
pub const MAX_FACTS: usize = 50;

/// Maximum description length (in characters) kept per fact
pub const MAX_DESC_CHARS: usize = 400;

/// Maximum neighbour rows read per expansion query
pub const MAX_ROWS: usize = 100;

/// Relationship type used when a connection names none
pub const DEFAULT_RELATION: &str = "RELATED_TO";

/// Graph neighbour lookup and maintenance
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// 1- and 2-hop neighbours of the given node ids
    async fn expand(&self, ids: &[String]) -> Result<Vec<GraphFact>>;

    /// Ensure the node id uniqueness constraint exists
    async fn create_constraints(&self) -> Result<()>;

    /// Merge a node (keyed by id) with its properties
    async fn upsert_node(&self, node: &DatasetNode) -> Result<()>;

    /// Merge a typed relationship between two existing nodes
    async fn create_relationship(&self, source_id: &str, relation: &str, target_id: &str)
        -> Result<()>;
}

/// One row of the expansion query: a 1-hop neighbour and an optional 2-hop
/// neighbour reached through it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborRecord {
    pub rel: String,
    pub labels: Vec<String>,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rel2: Option<String>,
    pub labels2: Vec<String>,
    pub id2: Option<String>,
    pub name2: Option<String>,
    pub description2: Option<String>,
}

/// Flatten neighbour rows into facts: each 1-hop fact is followed by its
/// 2-hop fact, descriptions are clipped and the list is capped.
#[must_use]
pub fn facts_from_records(records: Vec<NeighborRecord>) -> Vec<GraphFact> {
    let mut facts = Vec::with_capacity(records.len().min(MAX_FACTS));

    for record in records {
        if facts.len() >= MAX_FACTS {
            break;
        }

        let two_hop = match (record.rel2, record.id2) {
            (Some(rel2), Some(id2)) if !rel2.is_empty() => Some(GraphFact {
                source: Some(record.id.clone()),
                rel: rel2,
                target_id: id2,
                target_name: record.name2.unwrap_or_default(),
                target_desc: truncate_chars(
                    record.description2.as_deref().unwrap_or_default(),
                    MAX_DESC_CHARS,
                )
                .to_string(),
                labels: record.labels2,
            }),
            _ => None,
        };

        facts.push(GraphFact {
            source: None,
            rel: record.rel,
            target_id: record.id,
            target_name: record.name.unwrap_or_default(),
            target_desc: truncate_chars(
                record.description.as_deref().unwrap_or_default(),
                MAX_DESC_CHARS,
            )
            .to_string(),
            labels: record.labels,
        });

        if let Some(fact) = two_hop {
            facts.push(fact);
        }
    }

    facts.truncate(MAX_FACTS);
    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, second: Option<&str>) -> NeighborRecord {
        NeighborRecord {
            rel: "LOCATED_IN".to_string(),
            labels: vec!["City".to_string(), "Entity".to_string()],
            id: id.to_string(),
            name: Some(format!("name-{id}")),
            description: Some("A quiet town".to_string()),
            rel2: second.map(|_| "NEAR".to_string()),
            labels2: second
                .map(|_| vec!["Attraction".to_string()])
                .unwrap_or_default(),
            id2: second.map(ToString::to_string),
            name2: second.map(|s| format!("name-{s}")),
            description2: second.map(|_| "Sandy beach".to_string()),
        }
    }

    #[test]
    fn test_one_hop_precedes_two_hop() {
        let facts = facts_from_records(vec![record("a", Some("b")), record("c", None)]);

        assert_eq!(facts.len(), 3);
        assert_eq!(facts[0].target_id, "a");
        assert!(facts[0].source.is_none());
        assert_eq!(facts[1].target_id, "b");
        assert_eq!(facts[1].source.as_deref(), Some("a"));
        assert_eq!(facts[1].rel, "NEAR");
        assert_eq!(facts[2].target_id, "c");
        assert!(!facts[2].is_two_hop());
    }

    #[test]
    fn test_facts_capped_at_fifty() {
        let records: Vec<_> = (0..40)
            .map(|i| record(&format!("n{i}"), Some(&format!("m{i}"))))
            .collect();
        let facts = facts_from_records(records);

        assert_eq!(facts.len(), MAX_FACTS);
        assert_eq!(facts[48].target_id, "n24");
        assert_eq!(facts[49].target_id, "m24");
    }

    #[test]
    fn test_two_hop_without_target_id_is_dropped() {
        let mut rec = record("a", Some("b"));
        rec.id2 = None;
        let facts = facts_from_records(vec![rec]);

        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].target_id, "a");
    }

    #[test]
    fn test_descriptions_truncated_to_400_chars() {
        let mut rec = record("a", None);
        rec.description = Some("é".repeat(450));
        let facts = facts_from_records(vec![rec]);

        assert_eq!(facts[0].target_desc.chars().count(), MAX_DESC_CHARS);
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let rec = NeighborRecord {
            rel: "HAS".to_string(),
            id: "x".to_string(),
            ..Default::default()
        };
        let facts = facts_from_records(vec![rec]);
        assert_eq!(facts.len(), 1);
        assert!(facts[0].target_name.is_empty());
        assert!(facts[0].target_desc.is_empty());
    }
}
