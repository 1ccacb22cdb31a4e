//! Cosine similarity and pairwise similarity matrices

use super::common::{dot, norm};
use rayon::prelude::*;

/// Cosine similarity: `dot(a, b) / (|a| * |b|)`.
///
/// Returns `NaN` when the vectors differ in length or either norm is zero.
/// Treat `NaN` as "no relation": every threshold comparison against it is false.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::NAN;
    }
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return f32::NAN;
    }
    dot(a, b) / denom
}

/// Dense, symmetric `n x n` similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute all pairwise cosine similarities.
    ///
    /// Only the upper triangle is computed; it is mirrored into the lower
    /// triangle and the diagonal is fixed at 1.0.
    pub fn from_vectors<V>(vectors: &[V]) -> Self
    where
        V: AsRef<[f32]> + Sync,
    {
        let n = vectors.len();
        let rows: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let a = vectors[i].as_ref();
                ((i + 1)..n)
                    .map(|j| cosine_similarity(a, vectors[j].as_ref()))
                    .collect()
            })
            .collect();

        let mut values = vec![0.0f32; n * n];
        for (i, row) in rows.into_iter().enumerate() {
            values[i * n + i] = 1.0;
            for (offset, sim) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        Self { size: n, values }
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Similarity between items `i` and `j`, or `None` if out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.size || j >= self.size {
            return None;
        }
        Some(self.values[i * self.size + j])
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.size {
            return None;
        }
        Some(&self.values[i * self.size..(i + 1) * self.size])
    }

    /// Unordered pairs `(i, j, sim)` with `i < j` and `sim > threshold`,
    /// in row-major order.
    pub fn pairs_above(&self, threshold: f32) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let n = self.size;
        (0..n).flat_map(move |i| {
            ((i + 1)..n).filter_map(move |j| {
                let sim = self.values[i * n + j];
                // NaN never passes
                (sim > threshold).then_some((i, j, sim))
            })
        })
    }
}
