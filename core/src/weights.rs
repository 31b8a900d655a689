//! Term frequency, inverse document frequency and tf-idf vectors.

use crate::index::WeightVector;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How inverse document frequency is derived from document counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdfMode {
    /// `ln(N / df)`. A term present in every document gets weight 0.
    #[default]
    Raw,
    /// `ln(1 + N / df)`. Never zero, so corpus-wide terms still count.
    Smoothed,
}

impl IdfMode {
    fn score(self, num_docs: usize, df: usize) -> f64 {
        let ratio = num_docs as f64 / df as f64;
        match self {
            IdfMode::Raw => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

/// Relative frequency of each distinct token. Empty input gives an empty map.
pub fn term_frequency(tokens: &[String]) -> HashMap<String, f64> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    let total = tokens.len() as f64;
    counts
        .into_iter()
        .map(|(token, count)| (token.to_string(), count as f64 / total))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdfTable {
    scores: HashMap<String, f64>,
}

impl IdfTable {
    pub fn new() -> Self { Self::default() }

    /// Rebuild the table from scratch, one token list per document.
    /// An empty corpus leaves the table empty.
    pub fn recompute<'a, I>(&mut self, documents: I, mode: IdfMode)
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        self.scores.clear();
        let mut doc_freq: HashMap<&'a str, usize> = HashMap::new();
        let mut num_docs = 0usize;
        for tokens in documents {
            num_docs += 1;
            let distinct: HashSet<&'a str> = tokens.iter().map(String::as_str).collect();
            for token in distinct {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }
        if num_docs == 0 {
            return;
        }
        for (token, df) in doc_freq {
            self.scores.insert(token.to_string(), mode.score(num_docs, df));
        }
    }

    pub fn get(&self, token: &str) -> Option<f64> { self.scores.get(token).copied() }

    pub fn len(&self) -> usize { self.scores.len() }

    pub fn is_empty(&self) -> bool { self.scores.is_empty() }

    /// tf x idf for every token the table knows; unknown tokens are dropped.
    pub fn weight_vector(&self, tokens: &[String]) -> WeightVector {
        term_frequency(tokens)
            .into_iter()
            .filter_map(|(token, tf)| self.get(&token).map(|idf| (token, tf * idf)))
            .collect()
    }
}
