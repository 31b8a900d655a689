use crate::weights::IdfTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Sparse tf-idf vector: token -> non-negative weight. Ordered so that
/// magnitudes and dot products sum in the same order on every run.
pub type WeightVector = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self { MetadataValue::Text(s.to_string()) }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self { MetadataValue::Text(s) }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self { MetadataValue::Integer(n) }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self { MetadataValue::Float(n) }
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar JSON values only; arrays, objects and null yield `None`.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(MetadataValue::Text(s)),
            serde_json::Value::Bool(b) => Some(MetadataValue::Text(b.to_string())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(MetadataValue::Integer)
                .or_else(|| n.as_f64().map(MetadataValue::Float)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    /// Free-form category tag assigned at ingestion, e.g. "hardware".
    pub category: Option<String>,
    /// Collection tag, stamped by the store on insert.
    pub collection: Option<String>,
    /// Locally-unique chunk identifier, e.g. "um1974.pdf_3".
    pub chunk_id: Option<String>,
    /// Ingestion-specific keys (title, filename, source, chunk_index, ...).
    pub extra: BTreeMap<String, MetadataValue>,
}

impl DocMeta {
    pub fn new() -> Self { Self::default() }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_chunk_id(mut self, chunk_id: impl Into<String>) -> Self {
        self.chunk_id = Some(chunk_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(MetadataValue::as_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub meta: DocMeta,
}

impl Document {
    pub fn new(content: impl Into<String>, meta: DocMeta) -> Self {
        Self { content: content.into(), meta }
    }
}

/// Everything the store owns. `vectors[i]` always belongs to `documents[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub vocabulary: HashSet<String>,
    pub idf: IdfTable,
    pub vectors: Vec<WeightVector>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn is_consistent(&self) -> bool { self.documents.len() == self.vectors.len() }
}
