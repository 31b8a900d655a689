//! The document store: owns the corpus, re-indexes on insert, answers ranked
//! queries and keeps a snapshot on disk.

use crate::config::{SearchQuery, StoreConfig};
use crate::index::{Corpus, Document};
use crate::persist::{load_snapshot, save_all, SnapshotPaths};
use crate::similarity::cosine_similarity;
use crate::tokenizer::tokenize;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Tag used in stats for documents that never got a collection.
const UNKNOWN_COLLECTION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub document_count: usize,
    pub collection: String,
}

/// Storage name of a collection tag: "NUCLEO-F767ZI" -> "collection_nucleo_f767zi".
pub fn collection_key(tag: &str) -> String {
    format!("collection_{}", tag.to_lowercase().replace('-', "_"))
}

pub struct DocumentStore {
    paths: SnapshotPaths,
    config: StoreConfig,
    corpus: RwLock<Corpus>,
}

impl DocumentStore {
    /// Open the store rooted at `root`, restoring the last snapshot if there is
    /// a usable one. Never fails: a missing or broken snapshot means an empty store.
    pub fn open<P: AsRef<Path>>(root: P, config: StoreConfig) -> Self {
        let paths = SnapshotPaths::with_file(root, &config.snapshot_file);
        if let Err(e) = std::fs::create_dir_all(&paths.root) {
            tracing::warn!(root = %paths.root.display(), error = %e, "cannot create store directory");
        }
        let corpus = if paths.snapshot().exists() {
            match load_snapshot(&paths) {
                Ok(corpus) => {
                    tracing::info!(documents = corpus.documents.len(), "loaded snapshot");
                    corpus
                }
                Err(e) => {
                    tracing::warn!(path = %paths.snapshot().display(), error = %e, "ignoring unreadable snapshot");
                    Corpus::new()
                }
            }
        } else {
            Corpus::new()
        };
        tracing::info!(root = %paths.root.display(), "document store initialized");
        Self { paths, config, corpus: RwLock::new(corpus) }
    }

    pub fn len(&self) -> usize { self.corpus.read().documents.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn vocabulary_size(&self) -> usize { self.corpus.read().vocabulary.len() }

    /// Copy of the current corpus state.
    pub fn snapshot(&self) -> Corpus { self.corpus.read().clone() }

    /// Add a batch of documents under `collection`, re-weight the whole corpus and
    /// persist it. Returns false when there was nothing to index.
    pub fn insert(&self, documents: Vec<Document>, collection: &str) -> bool {
        if documents.is_empty() {
            tracing::warn!("no documents to add");
            return false;
        }
        let submitted = documents.len();
        let batch: Vec<Document> = documents
            .into_iter()
            .filter(|doc| !doc.content.trim().is_empty())
            .map(|mut doc| {
                doc.meta.collection = Some(collection.to_string());
                doc
            })
            .collect();
        if batch.len() < submitted {
            tracing::warn!(skipped = submitted - batch.len(), "skipping documents with empty content");
        }
        if batch.is_empty() {
            return false;
        }
        let added = batch.len();

        let mut corpus = self.corpus.write();
        let first_new = corpus.documents.len();
        corpus.documents.extend(batch);

        let token_lists: Vec<Vec<String>> =
            corpus.documents.iter().map(|doc| tokenize(&doc.content)).collect();
        for tokens in &token_lists[first_new..] {
            corpus.vocabulary.extend(tokens.iter().cloned());
        }
        corpus.idf.recompute(token_lists.iter().map(Vec::as_slice), self.config.idf_mode);
        let vectors: Vec<_> = token_lists.iter().map(|tokens| corpus.idf.weight_vector(tokens)).collect();
        corpus.vectors = vectors;

        if let Err(e) = save_all(&self.paths, &corpus) {
            tracing::error!(error = %e, "failed to persist snapshot");
        }

        tracing::info!(
            added,
            collection,
            total_documents = corpus.documents.len(),
            vocabulary_size = corpus.vocabulary.len(),
            "indexed documents"
        );
        true
    }

    /// Ranked retrieval. Returns `(document, distance)` pairs where
    /// `distance = 1 - cosine similarity`, best match first.
    pub fn search(&self, query: &SearchQuery) -> Vec<(Document, f64)> {
        let corpus = self.corpus.read();
        if corpus.documents.is_empty() {
            tracing::warn!("no documents in store");
            return Vec::new();
        }
        if query.k == 0 || query.text.trim().is_empty() {
            return Vec::new();
        }

        // An empty filter value means no filter.
        let collection = query.collection.as_deref().filter(|c| !c.is_empty());
        let category = query.category.as_deref().filter(|c| !c.is_empty());

        let query_vector = corpus.idf.weight_vector(&tokenize(&query.text));
        let mut hits: Vec<(usize, f64)> = Vec::new();
        for (i, (doc, vector)) in corpus.documents.iter().zip(corpus.vectors.iter()).enumerate() {
            if collection.is_some() && doc.meta.collection.as_deref() != collection { continue; }
            if category.is_some() && doc.meta.category.as_deref() != category { continue; }
            let similarity = cosine_similarity(&query_vector, vector);
            if similarity >= query.score_threshold {
                hits.push((i, 1.0 - similarity));
            }
        }
        // Stable: equal distances keep storage order.
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        hits.truncate(query.k);

        let preview: String = query.text.chars().take(50).collect();
        tracing::debug!(hits = hits.len(), query = %preview, "search complete");
        hits.into_iter().map(|(i, distance)| (corpus.documents[i].clone(), distance)).collect()
    }

    /// Documents only, for callers that do not need distances.
    pub fn relevant_documents(&self, query: &str, k: usize, collection: Option<&str>) -> Vec<Document> {
        let mut q = SearchQuery::new(query).k(k);
        q.collection = collection.map(str::to_string);
        self.search(&q).into_iter().map(|(doc, _)| doc).collect()
    }

    /// Distinct collection tags, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let corpus = self.corpus.read();
        let tags: BTreeSet<&str> =
            corpus.documents.iter().filter_map(|doc| doc.meta.collection.as_deref()).collect();
        tags.into_iter().map(str::to_string).collect()
    }

    /// Per-collection document counts keyed by [`collection_key`]. An empty
    /// filter counts every collection.
    pub fn stats(&self, collection: Option<&str>) -> BTreeMap<String, CollectionStats> {
        let corpus = self.corpus.read();
        let mut stats = BTreeMap::new();
        match collection.filter(|c| !c.is_empty()) {
            Some(tag) => {
                let document_count = corpus
                    .documents
                    .iter()
                    .filter(|doc| doc.meta.collection.as_deref() == Some(tag))
                    .count();
                stats.insert(collection_key(tag), CollectionStats { document_count, collection: tag.to_string() });
            }
            None => {
                for doc in &corpus.documents {
                    let tag = doc.meta.collection.as_deref().unwrap_or(UNKNOWN_COLLECTION);
                    stats
                        .entry(collection_key(tag))
                        .or_insert_with(|| CollectionStats { document_count: 0, collection: tag.to_string() })
                        .document_count += 1;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocMeta;
    use tempfile::tempdir;

    #[test]
    fn collection_key_normalizes_tag() {
        assert_eq!(collection_key("NUCLEO-F767ZI"), "collection_nucleo_f767zi");
    }

    #[test]
    fn insert_stamps_collection_and_skips_blank_content() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::open(dir.path(), StoreConfig::default());
        let docs = vec![
            Document::new("Timer interrupt configuration", DocMeta::new()),
            Document::new("   ", DocMeta::new()),
        ];
        assert!(store.insert(docs, "NUCLEO-F767ZI"));
        let corpus = store.snapshot();
        assert_eq!(corpus.documents.len(), 1);
        assert_eq!(corpus.documents[0].meta.collection.as_deref(), Some("NUCLEO-F767ZI"));
        assert!(corpus.is_consistent());

        assert!(!store.insert(vec![Document::new("", DocMeta::new())], "NUCLEO-F767ZI"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn zero_k_and_blank_query_return_nothing() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::open(dir.path(), StoreConfig::default());
        store.insert(vec![Document::new("clock tree setup", DocMeta::new()), Document::new("flash wait states", DocMeta::new())], "a");
        assert!(store.search(&SearchQuery::new("clock").k(0)).is_empty());
        assert!(store.search(&SearchQuery::new("  ")).is_empty());
        assert_eq!(store.search(&SearchQuery::new("clock")).len(), 1);
    }
}
