//! Trawl API Server
//!
//! Run with: cargo run
//!
//! # Configuration
//!
//! Loaded from a TOML file (`--config`, or the standard locations) with
//! environment variable overrides:
//! - `TRAWL_SOURCE_URL`: Upstream message collection URL
//! - `TRAWL_REFRESH_INTERVAL_SECS`: Background refresh period
//! - `TRAWL_MAX_RECORDS`: Fetch cap per refresh
//! - `TRAWL_CACHE_SIZE`: Query cache capacity
//! - `TRAWL_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `TRAWL_API_PORT`: Port to listen on (default: 8080)
//! - `TRAWL_LOG_LEVEL`: Log level (default: info)
//! - `TRAWL_LOG_FORMAT`: pretty or json (default: pretty)
//! - `RUST_LOG`: Full filter directive, overrides TRAWL_LOG_LEVEL

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trawl::api::{serve, AppState};
use trawl::config::{self, Config, LoggingConfig};
use trawl::search::SearchEngine;
use trawl::sync::{DataStore, HttpSource};

#[derive(Parser)]
#[command(name = "trawl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Full-text search over a synchronized message collection")]
struct Cli {
    /// Path to a TOML config file (default: standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Print a default config file to stdout and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        print!("{}", config::generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_default(),
    };

    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.port {
        config.api.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting trawl v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Upstream source: {}", config.source.url);

    // Wire source, store, and engine; the refresh hook republishes
    // every fetched collection as a new index snapshot
    let source = Arc::new(HttpSource::new(&config.source.url, config.source.timeout()));
    let engine = Arc::new(SearchEngine::new(config.search.cache_size));

    let mut store = DataStore::new(source, config.source.sync_config());
    let rebuild_engine = Arc::clone(&engine);
    store.set_on_refresh(Arc::new(move |messages| {
        rebuild_engine.rebuild(messages);
    }));
    let store = Arc::new(store);

    tracing::info!("Running initial refresh...");
    store
        .refresh(true)
        .await
        .context("Initial refresh failed")?;
    tracing::info!(
        total_messages = store.total_documents().await,
        "Initial index built"
    );

    store.start_background_refresh();

    serve(AppState::new(
        Arc::clone(&store),
        Arc::clone(&engine),
        config,
    ))
    .await?;

    if let Some(handle) = store.stop_background_refresh() {
        let _ = handle.await;
    }

    tracing::info!("Trawl stopped");
    Ok(())
}

/// Initialize the tracing subscriber from logging config
fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("trawl={},tower_http=info", config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
