//! Cytoscape.js element list

use crate::graph::{EdgeType, Graph};
use serde::{Deserialize, Serialize};

/// Node fill colour per difficulty tier, easy (green) to hard (red)
const DIFFICULTY_COLORS: [&str; 5] = ["#4CAF50", "#8BC34A", "#FFC107", "#FF9800", "#F44336"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CytoscapeDocument {
    pub elements: CytoscapeElements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CytoscapeElements {
    pub nodes: Vec<CytoscapeNode>,
    pub edges: Vec<CytoscapeEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CytoscapeNode {
    pub data: CytoscapeNodeData,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CytoscapeNodeData {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub topic: String,
    pub difficulty: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    #[serde(rename = "background-color")]
    pub background_color: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CytoscapeEdge {
    pub data: CytoscapeEdgeData,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CytoscapeEdgeData {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: f32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    #[serde(rename = "line-style")]
    pub line_style: String,
    #[serde(rename = "target-arrow-shape")]
    pub target_arrow_shape: String,
    pub width: f32,
}

fn difficulty_color(difficulty: u8) -> &'static str {
    let idx = (difficulty.clamp(1, 5) - 1) as usize;
    DIFFICULTY_COLORS[idx]
}

pub fn to_cytoscape(graph: &Graph) -> CytoscapeDocument {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| {
            let size = 20 + 6 * node.difficulty as u32;
            CytoscapeNode {
                data: CytoscapeNodeData {
                    id: node.id.clone(),
                    label: node.name.clone(),
                    kind: node.kind.to_string(),
                    topic: node.topic.clone(),
                    difficulty: node.difficulty,
                    description: node.description.clone(),
                },
                style: NodeStyle {
                    background_color: difficulty_color(node.difficulty).to_string(),
                    width: size,
                    height: size,
                },
            }
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|edge| {
            let (line_style, arrow) = match edge.kind {
                EdgeType::Dependency => ("solid", "triangle"),
                EdgeType::Similarity => ("dashed", "none"),
            };
            CytoscapeEdge {
                data: CytoscapeEdgeData {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    weight: edge.weight,
                    kind: edge.kind.to_string(),
                },
                style: EdgeStyle {
                    line_style: line_style.to_string(),
                    target_arrow_shape: arrow.to_string(),
                    width: 1.0 + 3.0 * edge.weight.clamp(0.0, 1.0),
                },
            }
        })
        .collect();

    CytoscapeDocument {
        elements: CytoscapeElements { nodes, edges },
    }
}
