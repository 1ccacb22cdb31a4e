//! Persistence for built concept graphs
//!
//! Graphs are stored one JSON file per graph; see [`storage`].

pub mod storage;

pub use storage::{
    sanitize_title, ExportedFile, GraphStorage, GraphSummary, PersistedGraph, PersistenceMetadata,
    SavedGraph, StorageError, StorageResult, StorageStats, FORMAT_VERSION,
};
