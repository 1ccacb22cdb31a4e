//! Deterministic offline embeddings
//!
//! Used when no backend is configured and whenever a backend call fails.
//! The vector depends only on the text and the dimension, so results are
//! stable within and across processes.

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;
const LCG_MODULUS: u64 = 233280;

/// 32-bit rolling hash (`h = h * 31 + unit`) over UTF-16 code units,
/// returned as an absolute value.
pub fn text_hash(text: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

/// Expand the text hash into a `dimensions`-long vector with components in `[-1, 1)`.
pub fn deterministic_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut seed = text_hash(text) as u64;
    (0..dimensions)
        .map(|_| {
            seed = (seed * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
            (seed as f64 / LCG_MODULUS as f64 * 2.0 - 1.0) as f32
        })
        .collect()
}
