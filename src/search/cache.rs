//! Bounded LRU cache for ranked query results
//!
//! Keys embed the snapshot version, so entries computed against an old
//! snapshot can never answer for a new one. Nothing is invalidated on
//! rebuild; superseded entries simply age out through the capacity bound.
//! `clear` exists for administrative force-refresh.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// (normalized query string, snapshot version)
pub type CacheKey = (String, u64);

/// The full ranked outcome of one query against one snapshot
///
/// `positions` is the complete ranked list before any pagination slice;
/// `total` is the match count reported regardless of skip/limit.
#[derive(Debug, PartialEq, Eq)]
pub struct RankedResult {
    pub positions: Vec<usize>,
    pub total: usize,
}

/// LRU map from cache key to shared ranked result
///
/// Recency is tracked in a VecDeque (front = oldest). Capacities are
/// small (hundreds to low thousands), so linear recency upkeep on hit is
/// not worth a fancier structure. A capacity of 0 disables caching.
#[derive(Debug)]
pub struct QueryCache {
    capacity: usize,
    entries: HashMap<CacheKey, Arc<RankedResult>>,
    recency: VecDeque<CacheKey>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(1024)),
            recency: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Look up a key, marking it most-recently-used on hit
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<RankedResult>> {
        let value = self.entries.get(key)?.clone();
        if let Some(idx) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(idx);
        }
        self.recency.push_back(key.clone());
        Some(value)
    }

    /// Insert a result, evicting the least-recently-used entries past
    /// capacity
    pub fn insert(&mut self, key: CacheKey, value: Arc<RankedResult>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), value).is_none() {
            self.recency.push_back(key);
        } else if let Some(idx) = self.recency.iter().position(|k| *k == key) {
            self.recency.remove(idx);
            self.recency.push_back(key);
        }
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
