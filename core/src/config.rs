use crate::persist::DEFAULT_SNAPSHOT_FILE;
use crate::weights::IdfMode;

pub const DEFAULT_K: usize = 5;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub idf_mode: IdfMode,
    /// File name of the snapshot inside the store directory.
    pub snapshot_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { idf_mode: IdfMode::Raw, snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string() }
    }
}

/// A ranked retrieval request. Filters are exact matches on document metadata.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub k: usize,
    pub collection: Option<String>,
    pub category: Option<String>,
    /// Minimum cosine similarity a document needs to be returned.
    pub score_threshold: f64,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            k: DEFAULT_K,
            collection: None,
            category: None,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }
}
