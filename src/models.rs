//! Core data types shared by the retrieval, prompting and ingest layers

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Metadata stored alongside each vector in the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub city: String,
}

/// A nearest-neighbour hit from the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: MatchMetadata,
}

impl Match {
    pub fn new(id: impl Into<String>, score: f32, metadata: MatchMetadata) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
        }
    }
}

/// A neighbour reached from a matched node by 1- or 2-hop graph expansion.
///
/// `source` is `None` for 1-hop facts (the source is one of the seed
/// matches) and holds the intermediate node id for 2-hop facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphFact {
    pub source: Option<String>,
    pub rel: String,
    pub target_id: String,
    pub target_name: String,
    pub target_desc: String,
    pub labels: Vec<String>,
}

impl GraphFact {
    pub const fn is_two_hop(&self) -> bool {
        self.source.is_some()
    }
}

/// Per-session user preferences, fixed for a conversation turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub budget: String,
    pub interests: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Preferences {
    pub fn new(budget: impl Into<String>, interests: impl Into<String>) -> Self {
        Self {
            budget: budget.into(),
            interests: interests.into(),
            template: None,
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

impl fmt::Display for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "budget: {}, interests: {}", self.budget, self.interests)?;
        if let Some(template) = &self.template {
            write!(f, ", template: {template}")?;
        }
        Ok(())
    }
}

/// Chat role for a prompt turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single prompt turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Outgoing edge declared on a dataset node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// A node from the travel dataset file used for ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetNode {
    pub id: String,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub semantic_text: Option<String>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Any other properties, written to the graph as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_deserializes_with_missing_metadata() {
        let json = r#"{"id": "city_hanoi", "score": 0.91}"#;
        let m: Match = serde_json::from_str(json).unwrap();
        assert_eq!(m.id, "city_hanoi");
        assert_eq!(m.metadata, MatchMetadata::default());
    }

    #[test]
    fn test_match_metadata_type_field() {
        let json = r#"{"id": "a", "score": 0.5, "metadata": {"name": "Hoi An", "type": "City", "tags": ["heritage"]}}"#;
        let m: Match = serde_json::from_str(json).unwrap();
        assert_eq!(m.metadata.entity_type, "City");
        assert_eq!(m.metadata.tags, vec!["heritage"]);
        assert!(m.metadata.city.is_empty());
    }

    #[test]
    fn test_chat_message_role_serialization() {
        let msg = ChatMessage::system("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_preferences_display() {
        let prefs = Preferences::new("low", "beach").with_template("concise");
        assert_eq!(prefs.to_string(), "budget: low, interests: beach, template: concise");
    }

    #[test]
    fn test_dataset_node_keeps_extra_properties() {
        let json = r#"{"id": "n1", "type": "Hotel", "stars": 4, "connections": [{"relation": "LOCATED_IN", "target": "city_hanoi"}]}"#;
        let node: DatasetNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type.as_deref(), Some("Hotel"));
        assert_eq!(node.extra.get("stars"), Some(&serde_json::json!(4)));
        assert_eq!(node.connections.len(), 1);
    }
}
