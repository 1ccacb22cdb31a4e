//! File-per-graph storage
//!
//! Each saved graph is one pretty-printed JSON file named
//! `<sanitized title>_<unix millis>.json` inside the storage directory.
//! The file holds the graph fields plus a `persistenceMetadata` object.

use crate::export::{export, ExportFormat};
use crate::graph::Graph;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Version stamped into every saved file
pub const FORMAT_VERSION: &str = "1.0";

const DEFAULT_TITLE: &str = "knowledge_graph";
const MAX_TITLE_LEN: usize = 50;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// No stored graph with this filename
    #[error("Graph not found: {0}")]
    NotFound(String),

    /// Filename is not a plain `.json` name inside the storage directory
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Provenance attached to a saved graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceMetadata {
    pub saved_at: String,
    pub title: String,
    pub version: String,
    /// Caller-supplied fields, stored alongside the fixed ones
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A graph as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedGraph {
    #[serde(flatten)]
    pub graph: Graph,
    #[serde(rename = "persistenceMetadata")]
    pub persistence: PersistenceMetadata,
}

#[derive(Serialize)]
struct PersistedGraphRef<'a> {
    #[serde(flatten)]
    graph: &'a Graph,
    #[serde(rename = "persistenceMetadata")]
    persistence: &'a PersistenceMetadata,
}

/// Result of a save
#[derive(Debug, Clone, PartialEq)]
pub struct SavedGraph {
    pub filename: String,
    pub path: PathBuf,
}

/// Listing entry for a stored graph
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub filename: String,
    pub title: String,
    pub timestamp: String,
    pub saved_at: String,
    pub total_concepts: usize,
    pub total_edges: usize,
    pub topics: Vec<String>,
}

/// A stored graph rendered in an export format
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    /// Suggested download name, e.g. `biology_1700000000000.gexf`
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_graphs: usize,
    pub total_bytes: u64,
}

/// Directory-backed graph store
#[derive(Debug, Clone)]
pub struct GraphStorage {
    dir: PathBuf,
}

impl GraphStorage {
    /// Open (and create if needed) a storage directory
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        debug!("Graph storage at {:?}", dir);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a graph and return the generated filename
    pub fn save(
        &self,
        graph: &Graph,
        title: Option<&str>,
        extra: Map<String, Value>,
    ) -> StorageResult<SavedGraph> {
        let now = Utc::now();
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let stem = format!("{}_{}", sanitize_title(&title), now.timestamp_millis());
        let mut filename = format!("{}.json", stem);
        let mut suffix = 1;
        while self.dir.join(&filename).exists() {
            filename = format!("{}_{}.json", stem, suffix);
            suffix += 1;
        }

        let persistence = PersistenceMetadata {
            saved_at: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            title,
            version: FORMAT_VERSION.to_string(),
            extra: strip_reserved(extra),
        };
        let body = serde_json::to_string_pretty(&PersistedGraphRef {
            graph,
            persistence: &persistence,
        })?;

        let path = self.dir.join(&filename);
        std::fs::write(&path, body)?;
        info!(
            "Saved graph '{}' ({} nodes, {} edges) to {:?}",
            persistence.title,
            graph.nodes.len(),
            graph.edges.len(),
            path
        );

        Ok(SavedGraph { filename, path })
    }

    /// All stored graphs, newest first
    pub fn list(&self) -> StorageResult<Vec<GraphSummary>> {
        let mut summaries = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            match read_persisted(&path) {
                Ok(stored) => summaries.push(summarize(filename, &stored)),
                Err(e) => warn!("Skipping unreadable graph file {:?}: {}", path, e),
            }
        }

        summaries.sort_by(|a, b| {
            parse_time(&b.timestamp)
                .cmp(&parse_time(&a.timestamp))
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        Ok(summaries)
    }

    /// Load a stored graph by filename
    pub fn load(&self, filename: &str) -> StorageResult<PersistedGraph> {
        let path = self.existing_path(filename)?;
        read_persisted(&path)
    }

    /// Delete a stored graph by filename
    pub fn delete(&self, filename: &str) -> StorageResult<()> {
        let path = self.existing_path(filename)?;
        std::fs::remove_file(&path)?;
        info!("Deleted graph {}", filename);
        Ok(())
    }

    /// Render a stored graph in the requested format
    pub fn export(&self, filename: &str, format: ExportFormat) -> StorageResult<ExportedFile> {
        let stored = self.load(filename)?;
        let exported = export(&stored.graph, format);
        let content_type = exported.content_type();
        let extension = exported.file_extension();
        let body = exported.into_body()?;

        let stem = filename.strip_suffix(".json").unwrap_or(filename);
        Ok(ExportedFile {
            filename: format!("{}.{}", stem, extension),
            content_type,
            body,
        })
    }

    /// Number of stored graphs and their combined size on disk
    pub fn stats(&self) -> StorageResult<StorageStats> {
        let mut stats = StorageStats::default();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                stats.total_graphs += 1;
                stats.total_bytes += entry.metadata()?.len();
            }
        }
        Ok(stats)
    }

    fn existing_path(&self, filename: &str) -> StorageResult<PathBuf> {
        validate_filename(filename)?;
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(StorageError::NotFound(filename.to_string()));
        }
        Ok(path)
    }
}

/// Lowercase, map runs of non-alphanumerics to `_`, trim, cap length.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed: String = out.trim_matches('_').chars().take(MAX_TITLE_LEN).collect();
    let trimmed = trimmed.trim_end_matches('_');
    if trimmed.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

fn validate_filename(filename: &str) -> StorageResult<()> {
    let plain = !filename.is_empty()
        && !filename.contains(['/', '\\'])
        && !filename.starts_with('.')
        && filename.ends_with(".json");
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidFilename(filename.to_string()))
    }
}

/// Caller metadata may not override the fixed persistence fields
fn strip_reserved(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in ["savedAt", "title", "version"] {
        if extra.remove(key).is_some() {
            debug!("Ignoring reserved persistence metadata key '{}'", key);
        }
    }
    extra
}

fn read_persisted(path: &Path) -> StorageResult<PersistedGraph> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn summarize(filename: String, stored: &PersistedGraph) -> GraphSummary {
    GraphSummary {
        filename,
        title: stored.persistence.title.clone(),
        timestamp: stored.graph.timestamp.clone(),
        saved_at: stored.persistence.saved_at.clone(),
        total_concepts: stored.graph.metadata.total_concepts,
        total_edges: stored.graph.metadata.total_edges,
        topics: stored.graph.metadata.topics.keys().cloned().collect(),
    }
}

fn parse_time(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}
