//! QuestGraph
//!
//! Turns a learning-content analysis (vocabulary plus levels of quests) into
//! a concept graph: concepts become nodes, embeddings drive similarity
//! edges and topic clustering, declared quest dependencies become directed
//! edges. Built graphs can be exported to Cytoscape.js, GEXF, CSV or JSON
//! and stored on disk.
//!
//! # Pipeline
//!
//! 1. [`graph::extract_concepts`] flattens an [`Analysis`] into unique concepts
//! 2. [`embed::EmbeddingProvider`] embeds each concept (remote backend or
//!    deterministic fallback, cached per text)
//! 3. k-means++ over the embeddings assigns topics
//! 4. dependency and similarity edges are synthesised
//! 5. [`export::export`] renders the graph, [`persistence::GraphStorage`] stores it
//!
//! ## Example Usage
//!
//! ```rust
//! use questgraph::{Analysis, EmbeddingProvider, GraphBuilder, GraphConfig};
//! use std::sync::Arc;
//!
//! let analysis = Analysis::from_json(
//!     r#"{"vocabulary": [{"term": "Mitochondria", "type": "organelle"}]}"#,
//! ).unwrap();
//!
//! let provider = Arc::new(EmbeddingProvider::mock(384));
//! let builder = GraphBuilder::new(provider, GraphConfig::default());
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let graph = rt.block_on(builder.generate_graph(&analysis));
//!
//! assert_eq!(graph.nodes.len(), 1);
//! assert_eq!(graph.nodes[0].id, "concept-0");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod embed;
pub mod export;
pub mod graph;
pub mod persistence;

pub use analysis::{Analysis, Level, NamedEntry, Quest, VocabularyEntry};
pub use config::{
    ConfigError, ConfigResult, EmbedConfig, EmbedProvider, GraphConfig, QuestGraphConfig,
    StorageConfig,
};
pub use embed::{
    EmbedError, EmbedResult, Embedding, EmbeddingBackend, EmbeddingClient, EmbeddingProvider,
    SimilarityBatch,
};
pub use export::{export, ExportFormat, Exported};
pub use graph::{
    Concept, ConceptType, EdgeType, Graph, GraphBuilder, GraphEdge, GraphMetadata, GraphNode,
    TopicSummary,
};
pub use persistence::{GraphStorage, GraphSummary, PersistedGraph, StorageError, StorageResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
