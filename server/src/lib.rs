use axum::{extract::{Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use docqa_core::sources::{extract_sources, retrieval_confidence, SourceRef};
use docqa_core::{CollectionStats, DocMeta, Document, DocumentStore, MetadataValue, SearchQuery};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;
const SNIPPET_BEFORE: usize = 100;
const SNIPPET_LEN: usize = 300;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    pub collection: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}
fn default_k() -> usize { docqa_core::config::DEFAULT_K }
fn default_threshold() -> f64 { docqa_core::config::DEFAULT_SCORE_THRESHOLD }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    pub sources: Vec<SourceRef>,
    pub confidence: f64,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub distance: f64,
    pub chunk_id: Option<String>,
    pub category: Option<String>,
    pub collection: Option<String>,
    pub title: Option<String>,
    pub snippet: String,
}

#[derive(Deserialize)]
pub struct StatsParams {
    pub collection: Option<String>,
}

#[derive(Deserialize)]
pub struct InsertDoc {
    pub content: String,
    pub category: Option<String>,
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub struct InsertRequest {
    pub collection: String,
    pub documents: Vec<InsertDoc>,
}

#[derive(Serialize)]
pub struct InsertResponse {
    pub inserted: bool,
    pub total_documents: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub admin_token: Option<String>,
}

fn cors_layer() -> CorsLayer {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    }
}

pub fn build_app(store: Arc<DocumentStore>, admin_token: Option<String>) -> Router {
    let app_state = AppState { store, admin_token };
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/collections", get(collections_handler))
        .route("/stats", get(stats_handler))
        .route("/documents", post(insert_handler))
        .with_state(app_state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let mut query = SearchQuery::new(params.q.clone())
        .k(params.k.clamp(1, MAX_K))
        .score_threshold(params.threshold);
    query.collection = params.collection;
    query.category = params.category;

    // Scoring walks every vector; keep it off the async workers.
    let store = state.store.clone();
    let ranked = tokio::task::spawn_blocking(move || store.search(&query))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("search task failed: {e}")))?;
    let sources = extract_sources(&ranked);
    let confidence = retrieval_confidence(&ranked);
    let highlighter = term_pattern(&params.q);
    let results: Vec<SearchHit> = ranked
        .into_iter()
        .map(|(doc, distance)| SearchHit {
            distance,
            snippet: snippet(&doc.content, highlighter.as_ref()),
            title: doc.meta.text("title").map(str::to_string),
            chunk_id: doc.meta.chunk_id,
            category: doc.meta.category,
            collection: doc.meta.collection,
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        results,
        sources,
        confidence,
    }))
}

pub async fn collections_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "collections": state.store.list_collections() }))
}

pub async fn stats_handler(State(state): State<AppState>, Query(params): Query<StatsParams>) -> Json<BTreeMap<String, CollectionStats>> {
    Json(state.store.stats(params.collection.as_deref()))
}

async fn insert_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(req): Json<InsertRequest>,
) -> Result<Json<InsertResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let documents: Vec<Document> = req.documents.into_iter().map(into_document).collect();
    let store = state.store.clone();
    let collection = req.collection;
    let inserted = tokio::task::spawn_blocking(move || store.insert(documents, &collection))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("indexing task failed: {e}")))?;
    if !inserted {
        return Err((StatusCode::BAD_REQUEST, "no indexable documents".into()));
    }
    Ok(Json(InsertResponse { inserted, total_documents: state.store.len() }))
}

fn into_document(doc: InsertDoc) -> Document {
    let mut meta = DocMeta::new();
    meta.category = doc.category;
    meta.chunk_id = doc.chunk_id;
    meta.extra = doc
        .metadata
        .into_iter()
        .filter_map(|(k, v)| MetadataValue::from_json(v).map(|v| (k, v)))
        .collect();
    Document::new(doc.content, meta)
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

/// Case-insensitive alternation of the raw query words.
fn term_pattern(query: &str) -> Option<Regex> {
    let terms: Vec<String> = query.split_whitespace().map(regex::escape).collect();
    if terms.is_empty() {
        return None;
    }
    regex::RegexBuilder::new(&terms.join("|")).case_insensitive(true).build().ok()
}

/// A window of the content around the first query word, with matches wrapped in `<em>`.
fn snippet(content: &str, terms: Option<&Regex>) -> String {
    let start = terms
        .and_then(|re| re.find(content))
        .map(|m| {
            content[..m.start()]
                .char_indices()
                .rev()
                .nth(SNIPPET_BEFORE - 1)
                .map(|(i, _)| i)
                .unwrap_or(0)
        })
        .unwrap_or(0);
    let window: String = content[start..].chars().take(SNIPPET_LEN).collect();
    match terms {
        Some(re) => re.replace_all(&window, "<em>$0</em>").into_owned(),
        None => window,
    }
}
