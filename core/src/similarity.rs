use crate::index::WeightVector;

fn magnitude(v: &WeightVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Cosine similarity of two sparse vectors, in [0, 1] for non-negative weights.
///
/// The dot product runs over shared tokens only, but each magnitude covers the
/// vector's full key set. Disjoint or zero-magnitude vectors score 0.
pub fn cosine_similarity(a: &WeightVector, b: &WeightVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut shared = false;
    let mut dot = 0.0f64;
    for (token, w) in small {
        if let Some(other) = large.get(token) {
            shared = true;
            dot += w * other;
        }
    }
    if !shared {
        return 0.0;
    }
    let norm = magnitude(a) * magnitude(b);
    if norm == 0.0 {
        return 0.0;
    }
    (dot / norm).clamp(0.0, 1.0)
}
