//! Core data types shared by the sync, index, and API layers
//!
//! The central type is `Message`: one short text record fetched from the
//! upstream source. Messages are immutable once fetched; the search index
//! addresses them by position within a snapshot, never by `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message record from the upstream collection
///
/// Mirrors the upstream wire format field-for-field. `timestamp` is
/// ISO-8601 on the wire (chrono serde).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Upstream identifier (opaque, unique within the collection)
    pub id: String,
    /// Identifier of the authoring user
    pub user_id: String,
    /// Display name of the authoring user (indexed for search)
    pub user_name: String,
    /// When the message was created upstream
    pub timestamp: DateTime<Utc>,
    /// The message text (primary search field)
    pub message: String,
}

impl Message {
    /// Create a message with the current timestamp
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            timestamp: Utc::now(),
            message: message.into(),
        }
    }

    /// Builder method: set the timestamp
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
