//! Query execution over the current snapshot
//!
//! `SearchEngine` owns the active `Snapshot` behind an atomic swap and a
//! bounded cache of ranked results. Reads clone the snapshot `Arc` under
//! a brief lock and compute lock-free from there; `rebuild` publishes a
//! fully-built replacement without ever mutating what readers hold.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::model::Message;
use crate::search::cache::{CacheKey, QueryCache, RankedResult};
use crate::search::index::Snapshot;
use crate::search::tokenizer::{stem, tokenize};

/// One page of ranked search results plus the full match count
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub documents: Vec<Message>,
    pub total: usize,
}

/// TF-IDF search engine with conjunctive retrieval and result caching
///
/// Rebuilds are expected to come from a single writer (the data
/// synchronizer serializes refreshes); concurrent readers are never
/// blocked by a rebuild beyond the pointer swap itself.
pub struct SearchEngine {
    snapshot: RwLock<Arc<Snapshot>>,
    cache: Mutex<QueryCache>,
}

impl SearchEngine {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            cache: Mutex::new(QueryCache::new(cache_capacity)),
        }
    }

    /// The currently published snapshot
    ///
    /// The returned `Arc` stays valid across concurrent rebuilds; readers
    /// finish against the snapshot they started with.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Version of the currently published snapshot (0 = never built)
    pub fn version(&self) -> u64 {
        self.snapshot.read().version
    }

    /// Build an index over `documents` and publish it atomically
    ///
    /// Returns the new snapshot version. The build runs off to the side;
    /// the write lock is held only for the pointer swap.
    pub fn rebuild(&self, documents: Arc<Vec<Message>>) -> u64 {
        let next_version = self.version() + 1;
        let built = Arc::new(Snapshot::build(next_version, documents));
        tracing::debug!(
            version = built.version,
            documents = built.total_documents(),
            terms = built.term_count(),
            "publishing rebuilt index"
        );
        *self.snapshot.write() = built;
        next_version
    }

    /// Ranked conjunctive search with post-ranking pagination
    ///
    /// Empty and stopword-only queries yield an empty result with total
    /// 0 rather than an error. `total` is the full match count and does
    /// not depend on `skip`/`limit`.
    pub fn search(&self, query: &str, skip: usize, limit: usize) -> SearchResults {
        let snapshot = self.snapshot();
        let ranked = self.ranked(&snapshot, query);

        let documents = ranked
            .positions
            .iter()
            .skip(skip)
            .take(limit)
            .map(|&p| snapshot.documents[p].clone())
            .collect();

        SearchResults {
            documents,
            total: ranked.total,
        }
    }

    /// Drop all cached rankings (administrative force-refresh)
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Number of resident cache entries
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Fetch or compute the full ranking for a query against a snapshot
    ///
    /// The cache key embeds the snapshot version, so entries from older
    /// snapshots can never answer for newer ones. Ranking runs outside
    /// the cache lock; if two callers race on the same miss, the second
    /// insert overwrites the first with an identical result.
    fn ranked(&self, snapshot: &Snapshot, query: &str) -> Arc<RankedResult> {
        let key: CacheKey = (query.trim().to_lowercase(), snapshot.version);
        if let Some(hit) = self.cache.lock().get(&key) {
            return hit;
        }
        let computed = Arc::new(Self::rank(snapshot, &key.0));
        self.cache.lock().insert(key, computed.clone());
        computed
    }

    /// Conjunctive retrieval and TF-IDF ranking, uncached
    fn rank(snapshot: &Snapshot, query: &str) -> RankedResult {
        let terms: Vec<String> = tokenize(query, true).iter().map(|t| stem(t)).collect();
        if terms.is_empty() {
            return RankedResult {
                positions: Vec::new(),
                total: 0,
            };
        }

        // Running intersection over postings in term order; a term with
        // no postings empties the result immediately.
        let mut matched: Option<HashSet<usize>> = None;
        for term in &terms {
            let Some(positions) = snapshot.postings.get(term) else {
                return RankedResult {
                    positions: Vec::new(),
                    total: 0,
                };
            };
            matched = Some(match matched {
                None => positions.clone(),
                Some(current) => current.intersection(positions).copied().collect(),
            });
            if matched.as_ref().is_some_and(HashSet::is_empty) {
                return RankedResult {
                    positions: Vec::new(),
                    total: 0,
                };
            }
        }

        let mut scored: Vec<(usize, f64)> = matched
            .unwrap_or_default()
            .into_iter()
            .map(|position| {
                let length = f64::from(snapshot.doc_lengths[position]);
                let score = terms
                    .iter()
                    .map(|term| {
                        let tf = snapshot.term_freq[position]
                            .get(term)
                            .copied()
                            .unwrap_or(0);
                        let idf = snapshot.idf.get(term).copied().unwrap_or(0.0);
                        (f64::from(tf) / length) * idf
                    })
                    .sum();
                (position, score)
            })
            .collect();

        // Score descending, then timestamp descending, then position
        // ascending so equal (score, timestamp) pairs order predictably.
        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| {
                    let ta = snapshot.documents[a.0].timestamp;
                    let tb = snapshot.documents[b.0].timestamp;
                    tb.cmp(&ta)
                })
                .then_with(|| a.0.cmp(&b.0))
        });

        let positions: Vec<usize> = scored.into_iter().map(|(p, _)| p).collect();
        let total = positions.len();
        RankedResult { positions, total }
    }
}
