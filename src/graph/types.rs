//! Core type definitions for the concept graph

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of knowledge unit a concept was extracted from
///
/// Unrecognised type strings from the blueprint are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConceptType {
    Vocabulary,
    Chapter,
    Quest,
    Item,
    Ability,
    Concept,
    Other(String),
}

impl ConceptType {
    pub fn as_str(&self) -> &str {
        match self {
            ConceptType::Vocabulary => "vocabulary",
            ConceptType::Chapter => "chapter",
            ConceptType::Quest => "quest",
            ConceptType::Item => "item",
            ConceptType::Ability => "ability",
            ConceptType::Concept => "concept",
            ConceptType::Other(s) => s.as_str(),
        }
    }

    /// Starting point for the difficulty score
    pub fn base_difficulty(&self) -> f64 {
        match self {
            ConceptType::Chapter | ConceptType::Vocabulary | ConceptType::Item => 1.0,
            ConceptType::Quest | ConceptType::Ability | ConceptType::Concept => 2.0,
            ConceptType::Other(_) => 1.0,
        }
    }
}

impl From<&str> for ConceptType {
    fn from(s: &str) -> Self {
        match s {
            "vocabulary" => ConceptType::Vocabulary,
            "chapter" => ConceptType::Chapter,
            "quest" => ConceptType::Quest,
            "item" => ConceptType::Item,
            "ability" => ConceptType::Ability,
            "concept" => ConceptType::Concept,
            other => ConceptType::Other(other.to_string()),
        }
    }
}

impl From<String> for ConceptType {
    fn from(s: String) -> Self {
        ConceptType::from(s.as_str())
    }
}

impl From<ConceptType> for String {
    fn from(t: ConceptType) -> Self {
        match t {
            ConceptType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named unit of knowledge extracted from the blueprint
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub name: String,
    pub kind: ConceptType,
    pub description: String,
    pub frequency: u32,
    /// Names of the concepts this one depends on
    pub context: Vec<String>,
}

/// Relationship type of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Similarity,
    Dependency,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Similarity => "similarity",
            EdgeType::Dependency => "dependency",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub frequency: u32,
    pub context: Vec<String>,
}

/// A concept placed in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable identifier, `concept-<index>`
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConceptType,
    pub description: String,
    pub embedding: Vec<f32>,
    /// Label of the cluster this node belongs to
    pub topic: String,
    /// Difficulty tier in `1..=5`
    pub difficulty: u8,
    pub metadata: NodeMetadata,
}

/// An undirected relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: f32,
    #[serde(rename = "type")]
    pub kind: EdgeType,
}

/// Aggregates for every node sharing a topic label
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub node_count: usize,
    pub avg_difficulty: f64,
    pub types: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub total_concepts: usize,
    pub total_edges: usize,
    /// Topic label -> summary, in cluster order
    pub topics: IndexMap<String, TopicSummary>,
    /// Embedding source used to build the graph ("openai", "mock", ...)
    pub embedding_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: String,
    pub name: String,
    pub nodes: Vec<String>,
    pub size: usize,
}

/// The assembled concept graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// RFC 3339 build time (UTC, millisecond precision)
    pub timestamp: String,
    pub metadata: GraphMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub clusters: Vec<ClusterSummary>,
}

impl Graph {
    /// A graph with no concepts
    pub fn empty(embedding_model: impl Into<String>) -> Self {
        Self {
            timestamp: now_timestamp(),
            metadata: GraphMetadata {
                total_concepts: 0,
                total_edges: 0,
                topics: IndexMap::new(),
                embedding_model: embedding_model.into(),
            },
            nodes: Vec::new(),
            edges: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Edges touching the given node, in either direction
    pub fn edges_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == id || e.target == id)
    }

    /// Check the structural invariants: edge endpoints exist, topics are
    /// summarised, counts match. Returns a description of the first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.metadata.total_concepts != self.nodes.len() {
            return Err(format!(
                "totalConcepts {} != {} nodes",
                self.metadata.total_concepts,
                self.nodes.len()
            ));
        }
        if self.metadata.total_edges != self.edges.len() {
            return Err(format!(
                "totalEdges {} != {} edges",
                self.metadata.total_edges,
                self.edges.len()
            ));
        }
        for edge in &self.edges {
            for end in [&edge.source, &edge.target] {
                if self.node(end).is_none() {
                    return Err(format!("edge {} references unknown node {}", edge.id, end));
                }
            }
        }
        for node in &self.nodes {
            if !self.metadata.topics.contains_key(&node.topic) {
                return Err(format!("node {} has unsummarised topic {}", node.id, node.topic));
            }
            if !(1..=5).contains(&node.difficulty) {
                return Err(format!("node {} difficulty {} out of range", node.id, node.difficulty));
            }
        }
        Ok(())
    }
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_type_round_trip_strings() {
        assert_eq!(ConceptType::from("quest"), ConceptType::Quest);
        assert_eq!(ConceptType::from("formula"), ConceptType::Other("formula".to_string()));
        assert_eq!(String::from(ConceptType::Ability), "ability");
        assert_eq!(ConceptType::Other("formula".to_string()).as_str(), "formula");

        let json = serde_json::to_string(&ConceptType::Chapter).unwrap();
        assert_eq!(json, "\"chapter\"");
    }

    #[test]
    fn test_empty_graph_json_shape() {
        let graph = Graph::empty("mock");
        let value = serde_json::to_value(&graph).unwrap();

        assert_eq!(value["metadata"]["totalConcepts"], 0);
        assert_eq!(value["metadata"]["totalEdges"], 0);
        assert_eq!(value["metadata"]["embeddingModel"], "mock");
        assert!(value["metadata"]["topics"].as_object().unwrap().is_empty());
        assert!(value["nodes"].as_array().unwrap().is_empty());
        assert!(graph.timestamp.ends_with('Z'));
        assert!(graph.check_invariants().is_ok());
    }

    #[test]
    fn test_edge_json_uses_type_field() {
        let edge = GraphEdge {
            id: "edge-0".to_string(),
            source: "concept-0".to_string(),
            target: "concept-1".to_string(),
            weight: 1.0,
            kind: EdgeType::Dependency,
        };
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["type"], "dependency");
    }
}
