//! Concept-graph construction
//!
//! Pipeline: extract concepts from the blueprint, embed their names,
//! cluster the embeddings into topics, score difficulty, link concepts by
//! declared dependency and by similarity, then summarise per topic.

use super::types::{
    now_timestamp, ClusterSummary, Concept, ConceptType, EdgeType, Graph, GraphEdge,
    GraphMetadata, GraphNode, NodeMetadata, TopicSummary,
};
use crate::analysis::{Analysis, NamedEntry};
use crate::config::GraphConfig;
use crate::embed::EmbeddingProvider;
use indexmap::IndexMap;
use questgraph_algorithms::{kmeans, SimilarityMatrix};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Display labels assigned to clusters by index, cycling past the end
pub const TOPIC_LABELS: [&str; 5] = [
    "Foundations",
    "Core Concepts",
    "Advanced Topics",
    "Applications",
    "Extensions",
];

/// Topic label for a cluster index
pub fn topic_label(cluster: usize) -> &'static str {
    TOPIC_LABELS[cluster % TOPIC_LABELS.len()]
}

/// Number of clusters to request for `n` concepts: `max(2, ceil(n / 3))`
pub fn cluster_count(n: usize) -> usize {
    n.div_ceil(3).max(2)
}

/// Difficulty tier in `1..=5`.
///
/// `(type base + 0.5 * dependencies) / ln(frequency + 2)`, clamped to
/// `[1, 5]` and rounded up.
pub fn difficulty(concept: &Concept) -> u8 {
    let base = concept.kind.base_difficulty() + 0.5 * concept.context.len() as f64;
    let score = base / (concept.frequency as f64 + 2.0).ln();
    score.clamp(1.0, 5.0).ceil() as u8
}

/// Walk the blueprint and collect unique concepts, first occurrence wins.
pub fn extract_concepts(analysis: &Analysis) -> Vec<Concept> {
    let mut collector = ConceptCollector::default();

    for entry in &analysis.vocabulary {
        let Some(term) = entry.term.as_deref() else {
            continue;
        };
        collector.push(Concept {
            name: term.to_string(),
            kind: entry
                .kind
                .as_deref()
                .map(ConceptType::from)
                .unwrap_or(ConceptType::Vocabulary),
            description: entry.description.clone().unwrap_or_default(),
            frequency: 1,
            context: Vec::new(),
        });
    }

    for level in &analysis.levels {
        if let Some(name) = level.name.as_deref() {
            collector.push(Concept {
                name: name.to_string(),
                kind: ConceptType::Chapter,
                description: level
                    .overview
                    .clone()
                    .or_else(|| level.description.clone())
                    .unwrap_or_default(),
                frequency: 2,
                context: Vec::new(),
            });
        }

        for quest in &level.quests {
            let title = quest.title.as_deref().unwrap_or("untitled");
            if quest.title.is_some() {
                collector.push(Concept {
                    name: title.to_string(),
                    kind: ConceptType::Quest,
                    description: quest.description.clone().unwrap_or_default(),
                    frequency: 1,
                    context: quest
                        .dependencies
                        .iter()
                        .filter(|d| !d.trim().is_empty())
                        .cloned()
                        .collect(),
                });
            }

            for item in &quest.items {
                if let Some(concept) = quest_child(item, ConceptType::Item, || {
                    format!("Item from quest: {}", title)
                }) {
                    collector.push(concept);
                }
            }
            for ability in &quest.abilities {
                if let Some(concept) = quest_child(ability, ConceptType::Ability, || {
                    format!("Ability learned in quest: {}", title)
                }) {
                    collector.push(concept);
                }
            }
        }
    }

    collector.concepts
}

/// Unnamed entries contribute no concept
fn quest_child<F>(entry: &NamedEntry, kind: ConceptType, describe: F) -> Option<Concept>
where
    F: FnOnce() -> String,
{
    let name = entry.name()?;
    let description = entry
        .description()
        .map(str::to_string)
        .unwrap_or_else(describe);
    Some(Concept {
        name: name.to_string(),
        kind,
        description,
        frequency: 1,
        context: Vec::new(),
    })
}

#[derive(Default)]
struct ConceptCollector {
    seen: HashSet<String>,
    concepts: Vec<Concept>,
}

impl ConceptCollector {
    fn push(&mut self, concept: Concept) {
        if concept.name.trim().is_empty() {
            return;
        }
        if self.seen.insert(concept.name.clone()) {
            self.concepts.push(concept);
        }
    }
}

/// Builds concept graphs from blueprints
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    provider: Arc<EmbeddingProvider>,
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(provider: Arc<EmbeddingProvider>, config: GraphConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &EmbeddingProvider {
        &self.provider
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Build the concept graph for a blueprint.
    ///
    /// Never fails: a blueprint without concepts yields an empty graph and
    /// embedding failures are absorbed by the provider.
    pub async fn generate_graph(&self, analysis: &Analysis) -> Graph {
        let concepts = extract_concepts(analysis);
        let method = self.provider.method().to_string();

        if concepts.is_empty() {
            info!("No concepts found in blueprint, returning empty graph");
            return Graph::empty(method);
        }

        info!("Generating concept graph from {} concepts", concepts.len());

        let names: Vec<&str> = concepts.iter().map(|c| c.name.as_str()).collect();
        let batch = self.provider.similarity_matrix(&names).await;

        let k = cluster_count(concepts.len());
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let rows: Vec<&[f32]> = batch.embeddings.iter().map(|e| e.as_slice()).collect();
        let clustering = kmeans(&rows, k, self.config.max_iterations, &mut rng);
        debug!(
            "Clustered into {} topics (requested {}, {} iterations, converged={})",
            clustering.num_clusters(),
            k,
            clustering.iterations,
            clustering.converged
        );

        let nodes: Vec<GraphNode> = concepts
            .iter()
            .enumerate()
            .map(|(i, concept)| GraphNode {
                id: node_id(i),
                name: concept.name.clone(),
                kind: concept.kind.clone(),
                description: concept.description.clone(),
                embedding: batch.embeddings[i].as_ref().clone(),
                topic: topic_label(clustering.assignments[i]).to_string(),
                difficulty: difficulty(concept),
                metadata: NodeMetadata {
                    frequency: concept.frequency,
                    context: concept.context.clone(),
                },
            })
            .collect();

        let edges = synthesize_edges(&concepts, &batch.matrix, self.config.similarity_threshold);

        let clusters: Vec<ClusterSummary> = clustering
            .clusters
            .iter()
            .enumerate()
            .map(|(c, members)| ClusterSummary {
                id: format!("cluster-{}", c),
                name: topic_label(c).to_string(),
                nodes: members.iter().map(|&i| node_id(i)).collect(),
                size: members.len(),
            })
            .collect();

        let metadata = GraphMetadata {
            total_concepts: nodes.len(),
            total_edges: edges.len(),
            topics: summarize_topics(&clustering.clusters, &nodes),
            embedding_model: method,
        };

        info!(
            "Concept graph ready: {} nodes, {} edges, {} topics",
            metadata.total_concepts,
            metadata.total_edges,
            metadata.topics.len()
        );

        Graph {
            timestamp: now_timestamp(),
            metadata,
            nodes,
            edges,
            clusters,
        }
    }
}

fn node_id(index: usize) -> String {
    format!("concept-{}", index)
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Dependency edges first, then similarity edges; at most one edge per
/// unordered pair.
///
/// A dependency edge points from the prerequisite to the dependent concept.
fn synthesize_edges(concepts: &[Concept], matrix: &SimilarityMatrix, threshold: f32) -> Vec<GraphEdge> {
    let mut by_name: HashMap<String, usize> = HashMap::with_capacity(concepts.len());
    for (i, concept) in concepts.iter().enumerate() {
        by_name.entry(concept.name.to_lowercase()).or_insert(i);
    }

    let mut connected: HashSet<(usize, usize)> = HashSet::new();
    let mut edges = Vec::new();

    for (i, concept) in concepts.iter().enumerate() {
        for dependency in &concept.context {
            let Some(&j) = by_name.get(&dependency.to_lowercase()) else {
                debug!("Unresolved dependency '{}' on '{}'", dependency, concept.name);
                continue;
            };
            if j == i || !connected.insert(pair_key(i, j)) {
                continue;
            }
            edges.push(GraphEdge {
                id: format!("edge-{}", edges.len()),
                source: node_id(j),
                target: node_id(i),
                weight: 1.0,
                kind: EdgeType::Dependency,
            });
        }
    }

    for (i, j, sim) in matrix.pairs_above(threshold) {
        if !connected.insert(pair_key(i, j)) {
            continue;
        }
        edges.push(GraphEdge {
            id: format!("edge-{}", edges.len()),
            source: node_id(i),
            target: node_id(j),
            weight: (sim * 1000.0).round() / 1000.0,
            kind: EdgeType::Similarity,
        });
    }

    edges
}

/// Per-topic aggregates, keyed in cluster order. Clusters past the last
/// label share a topic with an earlier cluster and are merged into it.
fn summarize_topics(clusters: &[Vec<usize>], nodes: &[GraphNode]) -> IndexMap<String, TopicSummary> {
    let mut topics: IndexMap<String, TopicSummary> = IndexMap::new();
    let mut difficulty_sums: HashMap<&'static str, u64> = HashMap::new();

    for (c, members) in clusters.iter().enumerate() {
        let label = topic_label(c);
        let summary = topics.entry(label.to_string()).or_default();
        let sum = difficulty_sums.entry(label).or_insert(0);
        for &i in members {
            let node = &nodes[i];
            summary.node_count += 1;
            summary.types.insert(node.kind.to_string());
            *sum += node.difficulty as u64;
        }
    }

    for (label, summary) in topics.iter_mut() {
        if summary.node_count > 0 {
            let sum = difficulty_sums.get(label.as_str()).copied().unwrap_or(0);
            summary.avg_difficulty = sum as f64 / summary.node_count as f64;
        }
    }
    topics
}
