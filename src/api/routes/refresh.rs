//! Refresh Routes
//!
//! Endpoint for forcing a synchronization cycle outside the
//! background schedule.
//!
//! - POST /refresh - Force a full refresh from the upstream source

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::RefreshResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /refresh
///
/// Force a refresh regardless of whether the upstream total
/// changed. A failed cycle keeps the previous snapshot and
/// reports 502.
pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RefreshResponse>> {
    match state.store.refresh(true).await {
        Ok(changed) => {
            // Drop ranked results computed against the replaced snapshot
            state.engine.clear_cache();

            let total = state.store.total_documents().await;
            tracing::info!(total_messages = total, changed, "Manual refresh completed");

            Ok(Json(RefreshResponse {
                status: if changed { "refreshed" } else { "unchanged" }.to_string(),
                total_messages: total,
                last_refresh: state.store.last_refresh().await,
            }))
        }
        Err(e) => {
            tracing::error!(error = %e, "Manual refresh failed");
            Err(ApiError::Upstream(e))
        }
    }
}
