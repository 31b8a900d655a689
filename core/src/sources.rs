//! Citation and confidence helpers for the answer layer.

use crate::index::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result count at which retrieval confidence stops being discounted.
const FULL_CONFIDENCE_HITS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub filename: Option<String>,
    pub chunk_id: Option<String>,
    pub category: Option<String>,
    /// `1 - distance`.
    pub relevance: f64,
}

/// One source per distinct (filename, chunk id), in ranking order.
pub fn extract_sources(results: &[(Document, f64)]) -> Vec<SourceRef> {
    let mut seen: HashSet<(Option<&str>, Option<&str>)> = HashSet::new();
    let mut sources = Vec::new();
    for (doc, distance) in results {
        let filename = doc.meta.text("filename");
        let chunk_id = doc.meta.chunk_id.as_deref();
        if !seen.insert((filename, chunk_id)) {
            continue;
        }
        sources.push(SourceRef {
            filename: filename.map(str::to_string),
            chunk_id: chunk_id.map(str::to_string),
            category: doc.meta.category.clone(),
            relevance: 1.0 - distance,
        });
    }
    sources
}

/// Mean relevance, discounted when fewer than five results came back.
pub fn retrieval_confidence(results: &[(Document, f64)]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let n = results.len() as f64;
    let mean = results.iter().map(|(_, distance)| 1.0 - distance).sum::<f64>() / n;
    (mean * (n / FULL_CONFIDENCE_HITS).min(1.0)).min(1.0)
}
