//! Search engine: tokenization, TF-IDF indexing, ranked retrieval, caching
//!
//! The pipeline is leaf-first:
//! - `tokenizer`: text -> normalized terms (pure functions)
//! - `index`: ordered documents -> immutable `Snapshot`
//! - `cache`: bounded LRU memo of ranked results per (query, version)
//! - `engine`: snapshot ownership, scoring, ranking, pagination
//!
//! Queries are synchronous CPU-bound computations over an immutable
//! snapshot; all mutation happens through `SearchEngine::rebuild`, which
//! swaps in a freshly built snapshot atomically.

pub mod cache;
pub mod engine;
pub mod index;
pub mod tokenizer;

pub use engine::{SearchEngine, SearchResults};
pub use index::Snapshot;
