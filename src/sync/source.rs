//! Upstream message source contract and HTTP implementation
//!
//! The upstream collection is read through a paginated GET endpoint
//! taking `skip` and `limit` parameters and returning `{items, total}`.
//! `MessageSource` abstracts that contract so the synchronizer can be
//! exercised against scripted sources in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::model::Message;

/// One page of the upstream collection
///
/// Both fields tolerate absence: an upstream that omits `items` or
/// `total` is read as empty/zero rather than rejected.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MessagePage {
    #[serde(default)]
    pub items: Vec<Message>,
    #[serde(default)]
    pub total: usize,
}

/// Errors raised while reading from the upstream source
///
/// `Terminal` statuses (401/403/404/429) end pagination outright and are
/// never retried; `Decode` aborts the refresh that hit it; everything
/// else is transient and eligible for retry with backoff.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request timeout")]
    Timeout,

    #[error("upstream unavailable")]
    Unavailable,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("upstream closed pagination with status {0}")]
    Terminal(u16),

    #[error("invalid payload: {0}")]
    Decode(String),
}

impl SourceError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, SourceError::Terminal(_) | SourceError::Decode(_))
    }
}

/// Paginated read access to the upstream collection
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch one page at the given offset
    async fn fetch_page(&self, skip: usize, limit: usize) -> Result<MessagePage, SourceError>;

    /// Cheap change probe: the upstream's reported total via a
    /// single-item page
    async fn total(&self) -> Result<usize, SourceError> {
        Ok(self.fetch_page(0, 1).await?.total)
    }
}

/// Production source over HTTP
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    /// Create a source reading from `url` with the given request timeout
    ///
    /// One pooled client serves every page of every refresh cycle.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trawl/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MessageSource for HttpSource {
    async fn fetch_page(&self, skip: usize, limit: usize) -> Result<MessagePage, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else if e.is_connect() {
                    SourceError::Unavailable
                } else {
                    SourceError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {}
            401 | 403 | 404 | 429 => return Err(SourceError::Terminal(status)),
            _ => return Err(SourceError::Status(status)),
        }

        response.json::<MessagePage>().await.map_err(|e| {
            if e.is_decode() {
                SourceError::Decode(e.to_string())
            } else if e.is_timeout() {
                SourceError::Timeout
            } else {
                SourceError::Transport(e.to_string())
            }
        })
    }
}
