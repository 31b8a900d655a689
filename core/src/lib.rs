pub mod config;
pub mod index;
pub mod persist;
pub mod similarity;
pub mod sources;
pub mod store;
pub mod tokenizer;
pub mod weights;

pub use config::{SearchQuery, StoreConfig};
pub use index::{Corpus, DocMeta, Document, MetadataValue, WeightVector};
pub use store::{collection_key, CollectionStats, DocumentStore};
pub use weights::{IdfMode, IdfTable};
