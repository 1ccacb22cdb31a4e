//! Graph export formats
//!
//! A built [`Graph`] can be handed to other tools as:
//! - `json`: the graph itself
//! - `cytoscape`: element list with styling hints for Cytoscape.js
//! - `gexf`: GEXF 1.2 XML (Gephi)
//! - `csv`: two sections, nodes then edges
//!
//! Unknown format names fall back to `json`.

pub mod csv;
pub mod cytoscape;
pub mod gexf;

use crate::graph::Graph;
use std::fmt;
use tracing::debug;

pub use cytoscape::CytoscapeDocument;

/// Requested export encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Cytoscape,
    Gexf,
    Csv,
}

impl ExportFormat {
    /// Parse a format selector; anything unrecognised means `Json`.
    pub fn parse(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "json" | "" => ExportFormat::Json,
            "cytoscape" => ExportFormat::Cytoscape,
            "gexf" => ExportFormat::Gexf,
            "csv" => ExportFormat::Csv,
            other => {
                debug!("Unknown export format '{}', using json", other);
                ExportFormat::Json
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Cytoscape => "cytoscape",
            ExportFormat::Gexf => "gexf",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::Cytoscape => "application/json",
            ExportFormat::Gexf => "application/xml",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Cytoscape => "cyjs",
            ExportFormat::Gexf => "gexf",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A graph encoded in one of the export formats
#[derive(Debug, Clone)]
pub enum Exported<'a> {
    Json(&'a Graph),
    Cytoscape(CytoscapeDocument),
    Gexf(String),
    Csv(String),
}

impl Exported<'_> {
    pub fn format(&self) -> ExportFormat {
        match self {
            Exported::Json(_) => ExportFormat::Json,
            Exported::Cytoscape(_) => ExportFormat::Cytoscape,
            Exported::Gexf(_) => ExportFormat::Gexf,
            Exported::Csv(_) => ExportFormat::Csv,
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.format().content_type()
    }

    pub fn file_extension(&self) -> &'static str {
        self.format().file_extension()
    }

    /// Render to text
    pub fn into_body(self) -> serde_json::Result<String> {
        match self {
            Exported::Json(graph) => serde_json::to_string_pretty(graph),
            Exported::Cytoscape(doc) => serde_json::to_string_pretty(&doc),
            Exported::Gexf(xml) => Ok(xml),
            Exported::Csv(text) => Ok(text),
        }
    }
}

/// Encode a graph in the requested format
pub fn export(graph: &Graph, format: ExportFormat) -> Exported<'_> {
    debug!("Exporting graph with {} nodes as {}", graph.nodes.len(), format);
    match format {
        ExportFormat::Json => Exported::Json(graph),
        ExportFormat::Cytoscape => Exported::Cytoscape(cytoscape::to_cytoscape(graph)),
        ExportFormat::Gexf => Exported::Gexf(gexf::to_gexf(graph)),
        ExportFormat::Csv => Exported::Csv(csv::to_csv(graph)),
    }
}
