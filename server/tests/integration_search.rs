use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use docqa_core::{DocMeta, Document, DocumentStore, StoreConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "secret";

fn build_tiny_store(dir: &std::path::Path) -> Arc<DocumentStore> {
    let store = DocumentStore::open(dir, StoreConfig::default());
    let docs = vec![
        Document::new(
            "GPIO pin output HAL function",
            DocMeta::new().with_category("hw").with_chunk_id("gpio.pdf_0").with_extra("filename", "gpio.pdf").with_extra("title", "GPIO"),
        ),
        Document::new(
            "UART serial communication baud rate",
            DocMeta::new().with_category("comm").with_chunk_id("uart.pdf_0").with_extra("filename", "uart.pdf"),
        ),
    ];
    assert!(store.insert(docs, "NUCLEO-F767ZI"));
    Arc::new(store)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = call(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn post_documents(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post("/documents").header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header("X-ADMIN-TOKEN", t);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    let app = docqa_server::build_app(build_tiny_store(dir.path()), None);

    let (status, json) = get(app, "/search?q=GPIO%20output%20pin&k=2").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["chunk_id"], "gpio.pdf_0");
    assert_eq!(arr[0]["title"], "GPIO");
    assert!(arr[0]["distance"].as_f64().unwrap() < 1.0);
    assert!(arr[0]["snippet"].as_str().unwrap().contains("<em>GPIO</em>"));
    assert_eq!(json["sources"][0]["filename"], "gpio.pdf");
}

#[tokio::test]
async fn search_applies_filters_and_threshold() {
    let dir = tempdir().unwrap();
    let store = build_tiny_store(dir.path());

    let (_, json) = get(docqa_server::build_app(store.clone(), None), "/search?q=GPIO&category=comm").await;
    assert_eq!(json["total_hits"], 0);

    let (_, json) = get(docqa_server::build_app(store.clone(), None), "/search?q=GPIO&collection=NUCLEO-F767ZI&threshold=0").await;
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"][0]["collection"], "NUCLEO-F767ZI");
}

#[tokio::test]
async fn collections_and_stats_endpoints() {
    let dir = tempdir().unwrap();
    let store = build_tiny_store(dir.path());

    let (status, json) = get(docqa_server::build_app(store.clone(), None), "/collections").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["collections"], serde_json::json!(["NUCLEO-F767ZI"]));

    let (_, json) = get(docqa_server::build_app(store.clone(), None), "/stats").await;
    assert_eq!(json["collection_nucleo_f767zi"]["document_count"], 2);

    let (_, json) = get(docqa_server::build_app(store, None), "/stats?collection=STM32F4-DISCO").await;
    assert_eq!(json["collection_stm32f4_disco"]["document_count"], 0);
}

#[tokio::test]
async fn insert_requires_admin_token() {
    let dir = tempdir().unwrap();
    let store = build_tiny_store(dir.path());
    let body = serde_json::json!({ "collection": "STM32F4-DISCO", "documents": [{ "content": "I2C master transmit" }] });

    let app = docqa_server::build_app(store.clone(), None);
    let (status, _) = call(app, post_documents(Some(TOKEN), body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let app = docqa_server::build_app(store.clone(), Some(TOKEN.into()));
    let (status, _) = call(app, post_documents(Some("wrong"), body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn insert_indexes_documents() {
    let dir = tempdir().unwrap();
    let store = build_tiny_store(dir.path());
    let app = docqa_server::build_app(store.clone(), Some(TOKEN.into()));

    let body = serde_json::json!({
        "collection": "STM32F4-DISCO",
        "documents": [{ "content": "I2C master transmit", "category": "comm", "chunk_id": "i2c_0", "metadata": { "page": 4 } }]
    });
    let (status, bytes) = call(app.clone(), post_documents(Some(TOKEN), body)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["inserted"], true);
    assert_eq!(json["total_documents"], 3);

    let (status, _) = call(app, post_documents(Some(TOKEN), serde_json::json!({ "collection": "x", "documents": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let reopened = DocumentStore::open(dir.path(), StoreConfig::default());
    assert_eq!(reopened.list_collections(), vec!["NUCLEO-F767ZI".to_string(), "STM32F4-DISCO".to_string()]);
}

#[tokio::test]
async fn empty_filter_params_are_ignored() {
    let dir = tempdir().unwrap();
    let store = build_tiny_store(dir.path());

    let (_, plain) = get(docqa_server::build_app(store.clone(), None), "/search?q=GPIO%20output%20pin").await;
    let (status, json) = get(docqa_server::build_app(store.clone(), None), "/search?q=GPIO%20output%20pin&collection=&category=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 1);
    assert_eq!(json["results"], plain["results"]);

    let (_, json) = get(docqa_server::build_app(store, None), "/stats?collection=").await;
    assert_eq!(json["collection_nucleo_f767zi"]["document_count"], 2);
    assert!(json.get("collection_").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_searches_agree() {
    let dir = tempdir().unwrap();
    let app = docqa_server::build_app(build_tiny_store(dir.path()), None);

    let (a, b, c) = tokio::join!(
        get(app.clone(), "/search?q=GPIO%20output%20pin"),
        get(app.clone(), "/search?q=GPIO%20output%20pin"),
        get(app, "/search?q=GPIO%20output%20pin"),
    );
    for (status, _) in [&a, &b, &c] {
        assert_eq!(*status, StatusCode::OK);
    }
    assert_eq!(a.1["results"], b.1["results"]);
    assert_eq!(b.1["results"], c.1["results"]);
    assert_eq!(a.1["results"][0]["chunk_id"], "gpio.pdf_0");
}
