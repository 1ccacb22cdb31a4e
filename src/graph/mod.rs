//! Concept graph model and construction
//!
//! - `types`: concepts, nodes, edges, topic summaries and the assembled `Graph`
//! - `builder`: blueprint -> concepts -> embeddings -> topics -> `Graph`

pub mod builder;
pub mod types;

// Re-export main types
pub use builder::{
    cluster_count, difficulty, extract_concepts, topic_label, GraphBuilder, TOPIC_LABELS,
};
pub use types::{
    ClusterSummary, Concept, ConceptType, EdgeType, Graph, GraphEdge, GraphMetadata, GraphNode,
    NodeMetadata, TopicSummary,
};
