//! Shared vector helpers
//!
//! All functions operate on plain `f32` slices so callers can pass
//! `Vec<f32>`, `Arc<Vec<f32>>` or borrowed rows without copying.

/// Dot product over the common prefix of `a` and `b`.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean (L2) norm.
#[inline]
pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// Squared Euclidean distance.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Component-wise mean of the given rows.
///
/// Returns `None` when `rows` is empty.
pub fn mean<'a, I>(rows: I, dim: usize) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum = vec![0.0f32; dim];
    let mut count = 0usize;
    for row in rows {
        for (s, v) in sum.iter_mut().zip(row.iter()) {
            *s += v;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = count as f32;
    sum.iter_mut().for_each(|s| *s /= n);
    Some(sum)
}
