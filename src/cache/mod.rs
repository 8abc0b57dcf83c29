//! Metadata cache for weather lookups.
//!
//! The cache only ever holds a small [`CacheEntry`](crate::weather::types::CacheEntry) pointing at a stored
//! artifact, never the payload itself. Entries expire after a fixed TTL and
//! are replaced wholesale on the next live fetch.
//!
//! Two backends are provided:
//! - [`SqliteCache`] persists entries across restarts
//! - [`MemoryCache`] keeps them in-process

mod memory;
mod storage;
mod traits;

pub use memory::MemoryCache;
pub use storage::SqliteCache;
pub use traits::MetadataCache;
