//! Search Routes
//!
//! Endpoint for running ranked full-text queries against the
//! current index snapshot.
//!
//! - GET /search?q=&skip=&limit= - Search the message collection

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{SearchParams, SearchResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /search
///
/// Run a conjunctive ranked query. Validates parameters, refuses
/// to serve before the first refresh, and marks successful
/// responses cacheable for 60 seconds.
pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Response> {
    let query = match params.q {
        Some(q) if !q.is_empty() => q,
        _ => {
            return Err(ApiError::Validation(
                "query parameter 'q' is required and must not be empty".to_string(),
            ))
        }
    };

    let limit = params.limit.unwrap_or(state.config.search.default_page_size);
    let max_limit = state.config.search.max_page_size;
    if limit < 1 || limit > max_limit {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {}",
            max_limit
        )));
    }

    let skip = params.skip.unwrap_or(0);

    if !state.store.is_ready().await {
        return Err(ApiError::ServiceUnavailable("Index not ready".to_string()));
    }

    let results = state.engine.search(&query, skip, limit);

    let body = SearchResponse {
        total: results.total,
        items: results.documents,
        query,
    };

    // Browsers and CDNs may serve cached responses for 60s
    Ok((
        StatusCode::OK,
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Json(body),
    )
        .into_response())
}
