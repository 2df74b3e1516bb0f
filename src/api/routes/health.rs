//! Health and Status Routes
//!
//! Service status and readiness endpoints for monitoring and probes.
//!
//! - GET / - Service status with index statistics
//! - GET /health - Readiness probe (index built and serving)

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{HealthResponse, IndexStats, StatusResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /
///
/// Service status. Always returns 200; `index_ready` and `stats`
/// report whether the initial refresh has landed.
pub async fn service_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let ready = state.store.is_ready().await;

    let stats = if ready {
        Some(IndexStats {
            total_messages: state.store.total_documents().await,
            last_refresh: state.store.last_refresh().await,
            refresh_interval_seconds: state.config.source.refresh_interval_secs,
        })
    } else {
        None
    };

    Json(StatusResponse {
        status: "ok".to_string(),
        index_ready: ready,
        stats,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health
///
/// Readiness probe. Returns 200 once the initial refresh has
/// completed, 503 before that.
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    if !state.store.is_ready().await {
        return Err(ApiError::ServiceUnavailable("Index not ready".to_string()));
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
    }))
}
