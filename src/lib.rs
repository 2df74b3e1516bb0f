//! # Trawl
//!
//! Full-text search service over a periodically synchronized message
//! collection. Trawl pulls documents from a paginated upstream source,
//! builds an in-memory TF-IDF index, and serves ranked conjunctive
//! queries over a REST API.
//!
//! ## Features
//!
//! - **Ranked search**: TF-IDF scoring with deterministic tie-breaks
//! - **Lossless pagination**: totals independent of the requested page
//! - **Atomic snapshots**: queries never observe a half-built index
//! - **Resilient sync**: per-page retry with exponential backoff
//! - **Query cache**: LRU cache keyed by normalized query and index version
//!
//! ## Modules
//!
//! - [`search`]: Tokenizer, index snapshot, ranking engine, query cache
//! - [`sync`]: Upstream source client and refresh scheduler
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trawl::search::SearchEngine;
//! use trawl::sync::{DataStore, HttpSource, SyncConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(HttpSource::new(
//!         "http://localhost:9000/messages",
//!         Duration::from_secs(30),
//!     ));
//!
//!     let engine = Arc::new(SearchEngine::new(1000));
//!     let mut store = DataStore::new(source, SyncConfig::default());
//!
//!     let rebuild = Arc::clone(&engine);
//!     store.set_on_refresh(Arc::new(move |messages| {
//!         rebuild.rebuild(messages);
//!     }));
//!
//!     let store = Arc::new(store);
//!     store.refresh(true).await?;
//!
//!     let results = engine.search("flight to paris", 0, 10);
//!     println!("Found {} matches", results.total);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod model;
pub mod search;
pub mod sync;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, ApiResult, AppState};

pub use config::{Config, ConfigError};

pub use model::Message;

pub use search::{SearchEngine, SearchResults, Snapshot};

pub use sync::{DataStore, HttpSource, MessagePage, MessageSource, SourceError, SyncConfig};
