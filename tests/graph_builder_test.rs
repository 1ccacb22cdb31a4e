//! End-to-end graph construction tests
//!
//! Covers concept extraction, edge synthesis, difficulty tiers, topic
//! metadata and reproducibility under a fixed clustering seed.

use async_trait::async_trait;
use questgraph::*;
use std::collections::HashMap;
use std::sync::Arc;

fn mock_builder(seed: Option<u64>) -> GraphBuilder {
    let provider = Arc::new(EmbeddingProvider::mock(384));
    GraphBuilder::new(
        provider,
        GraphConfig {
            seed,
            ..GraphConfig::default()
        },
    )
}

/// Every text embeds to the same direction, so every pair is maximally similar
struct ConstantBackend;

#[async_trait]
impl EmbeddingBackend for ConstantBackend {
    fn name(&self) -> &str {
        "constant"
    }

    async fn embed(&self, _text: &str) -> EmbedResult<Vec<f32>> {
        Ok(vec![0.5; 8])
    }
}

/// One-hot vector per known text: every pair is orthogonal and equidistant
struct OneHotBackend {
    index: HashMap<String, usize>,
}

impl OneHotBackend {
    fn new(names: &[String]) -> Self {
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Self { index }
    }
}

#[async_trait]
impl EmbeddingBackend for OneHotBackend {
    fn name(&self) -> &str {
        "one-hot"
    }

    async fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let mut v = vec![0.0; self.index.len()];
        if let Some(&i) = self.index.get(text) {
            v[i] = 1.0;
        }
        Ok(v)
    }
}

fn biology_analysis() -> Analysis {
    Analysis::from_json(
        r#"{
            "vocabulary": [
                {"term": "Cell", "type": "vocabulary", "description": "Basic unit of life"},
                {"term": "Mitochondria", "type": "item"},
                {"term": "Membrane"}
            ],
            "levels": [
                {
                    "name": "Cell Biology",
                    "overview": "How cells work",
                    "quests": [
                        {
                            "title": "Power the Cell",
                            "description": "Find the energy source",
                            "items": ["ATP", {"name": "Glucose", "description": "Sugar"}],
                            "abilities": ["Respiration"],
                            "dependencies": ["cell"]
                        },
                        {
                            "title": "Build Proteins",
                            "items": ["Ribosome"],
                            "dependencies": ["Power the Cell", "Unknown Concept"]
                        }
                    ]
                },
                {
                    "name": "Genetics",
                    "description": "Inheritance",
                    "quests": [
                        {"title": "Read the Code", "abilities": ["Transcription"], "dependencies": ["Build Proteins"]}
                    ]
                }
            ]
        }"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_empty_analysis_yields_empty_graph() {
    let analysis = Analysis::from_json("{}").unwrap();
    let graph = mock_builder(None).generate_graph(&analysis).await;

    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
    assert!(graph.clusters.is_empty());
    assert_eq!(graph.metadata.total_concepts, 0);
    assert_eq!(graph.metadata.total_edges, 0);
    assert!(graph.metadata.topics.is_empty());
    assert_eq!(graph.metadata.embedding_model, "mock");

    let json = serde_json::to_value(&graph).unwrap();
    assert_eq!(json["metadata"]["topics"], serde_json::json!({}));
}

#[tokio::test]
async fn test_null_collections_are_empty() {
    let analysis =
        Analysis::from_json(r#"{"vocabulary": null, "levels": [{"name": "Intro", "quests": null}]}"#)
            .unwrap();
    let graph = mock_builder(Some(1)).generate_graph(&analysis).await;

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].kind, ConceptType::Chapter);
}

#[tokio::test]
async fn test_two_vocabulary_items() {
    let analysis = Analysis::from_json(
        r#"{"vocabulary": [{"term": "Mitochondria", "type": "item"}, {"term": "Ribosome", "type": "item"}]}"#,
    )
    .unwrap();
    let graph = mock_builder(None).generate_graph(&analysis).await;

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["concept-0", "concept-1"]);
    assert!(graph.edges.len() <= 1);
    assert!(graph.edges.iter().all(|e| e.kind == EdgeType::Similarity));
    graph.check_invariants().unwrap();
}

#[tokio::test]
async fn test_dependency_edge_not_duplicated_by_similarity() {
    let analysis = Analysis::from_json(
        r#"{
            "vocabulary": [{"term": "A"}],
            "levels": [{"name": "L", "quests": [{"title": "B", "dependencies": ["A"]}]}]
        }"#,
    )
    .unwrap();

    let provider = Arc::new(EmbeddingProvider::with_backend(Arc::new(ConstantBackend), 8));
    let builder = GraphBuilder::new(provider, GraphConfig::default());
    let graph = builder.generate_graph(&analysis).await;

    let a = graph.node_by_name("A").unwrap().id.clone();
    let b = graph.node_by_name("B").unwrap().id.clone();

    let between: Vec<&GraphEdge> = graph
        .edges
        .iter()
        .filter(|e| (e.source == a && e.target == b) || (e.source == b && e.target == a))
        .collect();
    assert_eq!(between.len(), 1);
    assert_eq!(between[0].kind, EdgeType::Dependency);
    assert_eq!(between[0].source, a);
    assert_eq!(between[0].target, b);
    assert_eq!(between[0].weight, 1.0);

    // Every other pair is connected by similarity (all vectors identical)
    let n = graph.nodes.len();
    assert_eq!(graph.edges.len(), n * (n - 1) / 2);
    assert_eq!(graph.metadata.embedding_model, "constant");
    graph.check_invariants().unwrap();
}

#[tokio::test]
async fn test_full_blueprint() {
    let graph = mock_builder(Some(42)).generate_graph(&biology_analysis()).await;
    graph.check_invariants().unwrap();

    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Cell",
            "Mitochondria",
            "Membrane",
            "Cell Biology",
            "Power the Cell",
            "ATP",
            "Glucose",
            "Respiration",
            "Build Proteins",
            "Ribosome",
            "Genetics",
            "Read the Code",
            "Transcription",
        ]
    );

    let membrane = graph.node_by_name("Membrane").unwrap();
    assert_eq!(membrane.kind, ConceptType::Vocabulary);

    let chapter = graph.node_by_name("Cell Biology").unwrap();
    assert_eq!(chapter.kind, ConceptType::Chapter);
    assert_eq!(chapter.description, "How cells work");
    assert_eq!(chapter.metadata.frequency, 2);
    assert_eq!(graph.node_by_name("Genetics").unwrap().description, "Inheritance");

    let atp = graph.node_by_name("ATP").unwrap();
    assert_eq!(atp.kind, ConceptType::Item);
    assert_eq!(atp.description, "Item from quest: Power the Cell");
    assert_eq!(
        graph.node_by_name("Respiration").unwrap().description,
        "Ability learned in quest: Power the Cell"
    );

    // "cell" resolves case-insensitively; "Unknown Concept" is dropped
    let dependencies: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .filter(|e| e.kind == EdgeType::Dependency)
        .map(|e| {
            (
                graph.node(&e.source).unwrap().name.as_str(),
                graph.node(&e.target).unwrap().name.as_str(),
            )
        })
        .collect();
    assert_eq!(
        dependencies,
        vec![
            ("Cell", "Power the Cell"),
            ("Power the Cell", "Build Proteins"),
            ("Build Proteins", "Read the Code"),
        ]
    );

    let power = graph.node_by_name("Power the Cell").unwrap();
    let power_dependencies = graph
        .edges_of(&power.id)
        .filter(|e| e.kind == EdgeType::Dependency)
        .count();
    assert_eq!(power_dependencies, 2);

    // Dependency edges come first in the edge list
    let first_similarity = graph
        .edges
        .iter()
        .position(|e| e.kind == EdgeType::Similarity)
        .unwrap_or(graph.edges.len());
    assert!(graph.edges[first_similarity..]
        .iter()
        .all(|e| e.kind == EdgeType::Similarity));

    for (i, edge) in graph.edges.iter().enumerate() {
        assert_eq!(edge.id, format!("edge-{}", i));
    }

    // 13 concepts -> ceil(13/3) = 5 clusters requested
    assert!(graph.clusters.len() <= 5);
    let clustered: usize = graph.clusters.iter().map(|c| c.size).sum();
    assert_eq!(clustered, graph.nodes.len());

    let topic_nodes: usize = graph.metadata.topics.values().map(|t| t.node_count).sum();
    assert_eq!(topic_nodes, graph.nodes.len());
    for (label, summary) in &graph.metadata.topics {
        assert!(questgraph::graph::TOPIC_LABELS.contains(&label.as_str()));
        assert!(summary.avg_difficulty >= 1.0 && summary.avg_difficulty <= 5.0);
        assert!(!summary.types.is_empty());
    }
}

#[tokio::test]
async fn test_difficulty_in_range() {
    let graph = mock_builder(Some(3)).generate_graph(&biology_analysis()).await;
    for node in &graph.nodes {
        assert!((1..=5).contains(&node.difficulty), "{} -> {}", node.name, node.difficulty);
    }

    // quest base 2 + 0.5 per dependency, over ln(3)
    let build = graph.node_by_name("Build Proteins").unwrap();
    assert_eq!(build.difficulty, 3);
    let cell = graph.node_by_name("Cell").unwrap();
    assert_eq!(cell.difficulty, 1);
}

#[tokio::test]
async fn test_seeded_builds_are_reproducible() {
    let analysis = biology_analysis();
    let first = mock_builder(Some(99)).generate_graph(&analysis).await;
    let second = mock_builder(Some(99)).generate_graph(&analysis).await;

    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.edges, second.edges);
    assert_eq!(first.clusters, second.clusters);
    assert_eq!(first.metadata, second.metadata);
}

#[tokio::test]
async fn test_embeddings_match_provider() {
    let provider = Arc::new(EmbeddingProvider::mock(64));
    let builder = GraphBuilder::new(Arc::clone(&provider), GraphConfig::default());
    let graph = builder.generate_graph(&biology_analysis()).await;

    assert_eq!(provider.cache_len(), graph.nodes.len());
    for node in &graph.nodes {
        assert_eq!(node.embedding.len(), 64);
        let again = provider.embed(&node.name).await;
        assert_eq!(node.embedding, *again);
    }
}

#[tokio::test]
async fn test_graph_json_wire_format() {
    let graph = mock_builder(Some(5)).generate_graph(&biology_analysis()).await;
    let json = serde_json::to_value(&graph).unwrap();

    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(json["metadata"]["totalConcepts"], 13);
    assert!(json["metadata"]["embeddingModel"].is_string());
    assert_eq!(json["nodes"][0]["type"], "vocabulary");
    assert!(json["nodes"][0]["metadata"]["frequency"].is_number());
    assert_eq!(json["edges"][0]["type"], "dependency");

    let back: Graph = serde_json::from_value(json).unwrap();
    assert_eq!(back, graph);
}

#[tokio::test]
async fn test_unnamed_items_do_not_reject_blueprint() {
    let analysis = Analysis::from_json(
        r#"{
            "vocabulary": [{"term": "A"}],
            "levels": [{
                "name": "L",
                "quests": [{"title": "Q", "items": [{"description": "no name"}], "dependencies": "A"}]
            }]
        }"#,
    )
    .unwrap();
    let graph = mock_builder(Some(2)).generate_graph(&analysis).await;

    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["A", "L", "Q"]);

    let a = &graph.node_by_name("A").unwrap().id;
    let q = &graph.node_by_name("Q").unwrap().id;
    assert!(graph
        .edges
        .iter()
        .any(|e| e.kind == EdgeType::Dependency && &e.source == a && &e.target == q));
    graph.check_invariants().unwrap();
}

#[tokio::test]
async fn test_topic_labels_cycle_and_merge() {
    // 18 concepts -> 6 clusters, so the sixth cluster reuses the first label
    let names: Vec<String> = (0..18).map(|i| format!("Term {}", i)).collect();
    let vocabulary: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let kind = if i % 3 == 0 { "quest" } else { "item" };
            serde_json::json!({"term": n, "type": kind})
        })
        .collect();
    let analysis: Analysis =
        serde_json::from_value(serde_json::json!({ "vocabulary": vocabulary })).unwrap();

    let provider = Arc::new(EmbeddingProvider::with_backend(
        Arc::new(OneHotBackend::new(&names)),
        names.len(),
    ));
    let builder = GraphBuilder::new(
        provider,
        GraphConfig {
            seed: Some(17),
            ..GraphConfig::default()
        },
    );
    assert_eq!(builder.config().seed, Some(17));
    assert_eq!(builder.provider().method(), "one-hot");

    let graph = builder.generate_graph(&analysis).await;
    graph.check_invariants().unwrap();

    // Distinct seeds stay singletons under equidistant points
    assert_eq!(graph.clusters.len(), 6);
    assert_eq!(graph.clusters[5].name, "Foundations");
    assert_eq!(graph.metadata.topics.len(), 5);
    assert_eq!(
        graph.metadata.topics.keys().next().map(String::as_str),
        Some("Foundations")
    );

    let topic_nodes: usize = graph.metadata.topics.values().map(|t| t.node_count).sum();
    assert_eq!(topic_nodes, graph.nodes.len());

    let foundations = &graph.metadata.topics["Foundations"];
    let merged = graph.clusters[0].size + graph.clusters[5].size;
    assert_eq!(foundations.node_count, merged);

    for (label, summary) in &graph.metadata.topics {
        let members: Vec<&GraphNode> = graph.nodes.iter().filter(|n| &n.topic == label).collect();
        assert_eq!(members.len(), summary.node_count);
        let mean = members.iter().map(|n| n.difficulty as f64).sum::<f64>() / members.len() as f64;
        assert!((summary.avg_difficulty - mean).abs() < 1e-9, "{}", label);
    }
}
