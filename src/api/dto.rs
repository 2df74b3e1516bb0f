//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Message;

// ============================================
// SEARCH DTOs
// ============================================

/// Search query parameters
///
/// All fields are optional at the wire level so that validation
/// failures produce the API's own error body instead of an
/// extractor rejection.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query text
    #[serde(default)]
    pub q: Option<String>,
    /// Number of ranked results to skip
    #[serde(default)]
    pub skip: Option<usize>,
    /// Maximum results per page
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Total matches before pagination
    pub total: usize,
    /// Current page of ranked matches
    pub items: Vec<Message>,
    /// The query as received
    pub query: String,
}

// ============================================
// STATUS DTOs
// ============================================

/// Index statistics, present once the first refresh has landed
#[derive(Debug, Serialize)]
pub struct IndexStats {
    /// Documents in the current snapshot
    pub total_messages: usize,
    /// Completion time of the last successful refresh
    pub last_refresh: Option<DateTime<Utc>>,
    /// Background refresh period in seconds
    pub refresh_interval_seconds: u64,
}

/// Service status response for the root endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always "ok" while the process serves traffic
    pub status: String,
    /// Whether the initial refresh has completed
    pub index_ready: bool,
    /// Index statistics, null until ready
    pub stats: Option<IndexStats>,
    /// Application version
    pub version: String,
}

/// Readiness probe response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the index is ready
    pub status: String,
}

// ============================================
// REFRESH DTOs
// ============================================

/// Manual refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// "refreshed" when a new snapshot was published, "unchanged" otherwise
    pub status: String,
    /// Documents in the snapshot after the refresh
    pub total_messages: usize,
    /// Completion time of the refresh
    pub last_refresh: Option<DateTime<Utc>>,
}
