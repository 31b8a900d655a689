use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use docqa_core::{DocMeta, Document, DocumentStore, IdfMode, MetadataValue, SearchQuery, StoreConfig};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

mod bootstrap;

const DEFAULT_COLLECTION: &str = "NUCLEO-F767ZI";
const DEFAULT_DATA_DIR: &str = "./data/vector_store";

/// One pre-chunked document as produced by the extraction pipeline.
#[derive(Debug, Deserialize)]
struct InputDoc {
    id: Option<String>,
    title: Option<String>,
    #[serde(alias = "body")]
    content: String,
    category: Option<String>,
    filename: Option<String>,
    #[serde(default)]
    meta: Option<serde_json::Value>,
}

#[derive(Parser)]
#[command(name = "docqa-indexer")]
#[command(about = "Load documents into the retrieval store and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert documents from JSON/JSONL files or a directory of them
    Ingest {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Collection tag stamped on every document
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
        /// Store directory
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: String,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
    },
    /// Seed the built-in reference documents into a nearly empty store
    Bootstrap {
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: String,
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
    },
    /// Print per-collection document counts
    Stats {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: String,
        #[arg(long)]
        collection: Option<String>,
    },
    /// Run a query against the store and print ranked results
    Search {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: String,
        #[arg(long)]
        query: String,
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 0.1)]
        threshold: f64,
    },
}

fn store_config(smoothed_idf: bool) -> StoreConfig {
    let idf_mode = if smoothed_idf { IdfMode::Smoothed } else { IdfMode::Raw };
    StoreConfig { idf_mode, ..StoreConfig::default() }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { input, collection, data_dir, smoothed_idf } => {
            let store = DocumentStore::open(&data_dir, store_config(smoothed_idf));
            ingest(&store, Path::new(&input), &collection)
        }
        Commands::Bootstrap { collection, data_dir, smoothed_idf } => {
            let store = DocumentStore::open(&data_dir, store_config(smoothed_idf));
            if !bootstrap::is_needed(&store) {
                tracing::info!(documents = store.len(), "documents already available");
                return Ok(());
            }
            if !bootstrap::seed(&store, &collection) {
                bail!("bootstrap failed");
            }
            Ok(())
        }
        Commands::Stats { data_dir, collection } => {
            let store = DocumentStore::open(&data_dir, StoreConfig::default());
            let stats = store.stats(collection.as_deref());
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::Search { data_dir, query, k, collection, category, threshold } => {
            let store = DocumentStore::open(&data_dir, StoreConfig::default());
            let mut q = SearchQuery::new(query).k(k).score_threshold(threshold);
            q.collection = collection;
            q.category = category;
            let results: Vec<serde_json::Value> = store
                .search(&q)
                .into_iter()
                .map(|(doc, distance)| serde_json::json!({ "distance": distance, "document": doc }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
    }
}

fn ingest(store: &DocumentStore, input: &Path, collection: &str) -> Result<()> {
    let files = collect_input_files(input);
    if files.is_empty() {
        bail!("no .json or .jsonl files found at {}", input.display());
    }
    let mut documents = Vec::new();
    for file in &files {
        let before = documents.len();
        documents.extend(load_file(file)?);
        tracing::info!(file = %file.display(), documents = documents.len() - before, "loaded input file");
    }
    if !store.insert(documents, collection) {
        bail!("nothing was indexed from {}", input.display());
    }
    tracing::info!(total_documents = store.len(), vocabulary_size = store.vocabulary_size(), "ingest complete");
    Ok(())
}

fn collect_input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn load_file(file: &Path) -> Result<Vec<Document>> {
    let fallback_name = file.file_name().and_then(|s| s.to_str()).unwrap_or("input").to_string();
    let mut inputs: Vec<InputDoc> = Vec::new();
    let reader = BufReader::new(File::open(file)?);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            inputs.push(serde_json::from_str(&line)?);
        }
    } else {
        let json: serde_json::Value = serde_json::from_reader(reader)?;
        match json {
            serde_json::Value::Array(arr) => {
                for v in arr {
                    inputs.push(serde_json::from_value(v)?);
                }
            }
            serde_json::Value::Object(_) => inputs.push(serde_json::from_value(json)?),
            _ => tracing::warn!(file = %file.display(), "skipping file without document objects"),
        }
    }
    Ok(inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| to_document(input, i, &fallback_name))
        .collect())
}

fn to_document(input: InputDoc, index: usize, fallback_name: &str) -> Document {
    let filename = input.filename.unwrap_or_else(|| fallback_name.to_string());
    let chunk_id = input.id.unwrap_or_else(|| format!("{filename}_{index}"));
    let mut meta = DocMeta::new()
        .with_chunk_id(chunk_id)
        .with_extra("filename", filename)
        .with_extra("chunk_index", index as i64);
    meta.category = input.category;
    if let Some(title) = input.title {
        meta.extra.insert("title".into(), MetadataValue::Text(title));
    }
    if let Some(serde_json::Value::Object(map)) = input.meta {
        for (key, value) in map {
            match MetadataValue::from_json(value) {
                Some(v) => { meta.extra.insert(key, v); }
                None => tracing::debug!(key = %key, "dropping non-scalar metadata value"),
            }
        }
    }
    Document::new(input.content, meta)
}
