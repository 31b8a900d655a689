use anyhow::Result;
use axum::Router;
use clap::Parser;
use docqa_core::{DocumentStore, IdfMode, StoreConfig};
use docqa_server::build_app;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Store directory holding the snapshot
    #[arg(long, default_value = "./data/vector_store")]
    data_dir: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Use smoothed IDF = ln(1 + N/df) when re-indexing on insert
    #[arg(long, default_value_t = false)]
    smoothed_idf: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let idf_mode = if args.smoothed_idf { IdfMode::Smoothed } else { IdfMode::Raw };
    let store = Arc::new(DocumentStore::open(&args.data_dir, StoreConfig { idf_mode, ..StoreConfig::default() }));
    tracing::info!(documents = store.len(), collections = ?store.list_collections(), "store ready");

    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    if admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set; document uploads are disabled");
    }
    let app: Router = build_app(store, admin_token);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
