//! CAP Docs - External-Docs Cache
//!
//! A content-addressed TTL+LRU cache for external-library documentation
//! lookups, backing the `context7` source adapter.

mod cache;
mod error;
mod stats;

pub use cache::{ExternalDocsCache, DEFAULT_TTL_SECS, MAX_ENTRIES};
pub use error::{DocsCacheError, DocsCacheResult};
pub use stats::CacheStats;
