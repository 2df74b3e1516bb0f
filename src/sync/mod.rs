//! Data synchronization against the upstream message source
//!
//! `source` defines the paginated read contract (`MessageSource`) and its
//! HTTP implementation; `store` owns the canonical document list, drives
//! probe/fetch/retry cycles, and hands successful refreshes to the search
//! engine through a registered hook. The store is the sole writer of
//! shared state; everything else only reads.

pub mod source;
pub mod store;

pub use source::{HttpSource, MessagePage, MessageSource, SourceError};
pub use store::{DataStore, SyncConfig};
