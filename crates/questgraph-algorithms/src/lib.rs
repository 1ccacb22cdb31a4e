//! Vector algorithms for QuestGraph
//!
//! Pure, allocation-light math used by the concept-graph builder:
//! cosine similarity, dense similarity matrices and k-means++ clustering.

pub mod common;
pub mod kmeans;
pub mod similarity;

pub use common::{dot, norm, squared_euclidean};
pub use kmeans::{kmeans, kmeans_plus_plus_init, KMeansResult, DEFAULT_MAX_ITERATIONS};
pub use similarity::{cosine_similarity, SimilarityMatrix};
