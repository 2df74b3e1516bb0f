//! Trawl REST API
//!
//! HTTP API layer for trawl, built with Axum.
//!
//! # Endpoints
//!
//! ## Search
//! - `GET /search?q=&skip=&limit=` - Ranked full-text search
//!
//! ## Refresh
//! - `POST /refresh` - Force a synchronization cycle
//!
//! ## Status
//! - `GET /` - Service status with index statistics
//! - `GET /health` - Readiness probe
//!
//! # Example
//!
//! ```rust,ignore
//! use trawl::api::{serve, AppState};
//! use trawl::config::Config;
//! use trawl::search::SearchEngine;
//! use trawl::sync::{DataStore, HttpSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = Arc::new(HttpSource::new(&config.source.url, config.source.timeout()));
//!     let engine = Arc::new(SearchEngine::new(config.search.cache_size));
//!     let store = Arc::new(DataStore::new(source, config.source.sync_config()));
//!
//!     store.refresh(true).await?;
//!     serve(AppState::new(store, engine, config)).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.api.cors_origins);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::health::service_status))
        .route("/health", get(routes::health::health))
        .route("/search", get(routes::search::search_messages))
        .route("/refresh", post(routes::refresh::trigger_refresh))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(add_response_time))
        .with_state(shared_state)
}

/// Build the CORS layer from configured origins; empty means any
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let mut allowed = Vec::new();
    for origin in origins {
        match origin.parse::<HeaderValue>() {
            Ok(value) => allowed.push(value),
            Err(_) => tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Record wall-clock handler time on every response
async fn add_response_time(request: axum::extract::Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{:.2}", elapsed_ms)) {
        response.headers_mut().insert("x-response-time-ms", value);
    }

    response
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.api.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Trawl API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Trawl API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
