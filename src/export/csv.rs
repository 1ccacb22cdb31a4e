//! Two-section CSV export
//!
//! ```text
//! Nodes
//! "id","name","type","topic","difficulty","description","frequency","dependencies"
//! ...
//!
//! Edges
//! "id","source","target","type","weight"
//! ...
//! ```
//!
//! Every field is double-quoted; embedded quotes are doubled.

use crate::graph::Graph;

pub const NODES_SECTION: &str = "Nodes";
pub const EDGES_SECTION: &str = "Edges";

const NODE_COLUMNS: [&str; 8] = [
    "id",
    "name",
    "type",
    "topic",
    "difficulty",
    "description",
    "frequency",
    "dependencies",
];
const EDGE_COLUMNS: [&str; 5] = ["id", "source", "target", "type", "weight"];

/// Quote a field, doubling any embedded quote characters
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn to_csv(graph: &Graph) -> String {
    let mut lines = Vec::with_capacity(graph.nodes.len() + graph.edges.len() + 5);

    lines.push(NODES_SECTION.to_string());
    lines.push(row(NODE_COLUMNS));
    for node in &graph.nodes {
        lines.push(row([
            node.id.clone(),
            node.name.clone(),
            node.kind.to_string(),
            node.topic.clone(),
            node.difficulty.to_string(),
            node.description.clone(),
            node.metadata.frequency.to_string(),
            node.metadata.context.join("; "),
        ]));
    }

    lines.push(String::new());
    lines.push(EDGES_SECTION.to_string());
    lines.push(row(EDGE_COLUMNS));
    for edge in &graph.edges {
        lines.push(row([
            edge.id.clone(),
            edge.source.clone(),
            edge.target.clone(),
            edge.kind.to_string(),
            edge.weight.to_string(),
        ]));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
