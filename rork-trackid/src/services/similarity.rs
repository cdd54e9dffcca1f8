//! String similarity
//!
//! Normalized Levenshtein distance (insert/delete/substitute at unit cost,
//! no transpositions) over [`normalize`]d input.

use crate::services::text_normalizer::normalize;

/// Similarity between two strings in `[0.0, 1.0]`
///
/// `1 - levenshtein(a', b') / max(len(a'), len(b'))` where `x'` is
/// `normalize(x)` and lengths are in characters. Two empty strings are
/// identical (1.0). Symmetric.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }

    strsim::normalized_levenshtein(&a, &b) as f32
}
