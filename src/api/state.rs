//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::Config;
use crate::search::SearchEngine;
use crate::sync::DataStore;
use std::sync::Arc;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Synchronized document store
    pub store: Arc<DataStore>,
    /// Search engine holding the current index snapshot
    pub engine: Arc<SearchEngine>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(store: Arc<DataStore>, engine: Arc<SearchEngine>, config: Config) -> Self {
        Self {
            store,
            engine,
            config: Arc::new(config),
        }
    }
}
