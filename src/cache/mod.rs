//! Response caching for enrichment calls.
//!
//! An enrichment result depends only on the model, the system prompt, the
//! requested schema and the prompt, so repeating a call can be answered
//! without touching the network.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | TTL, enable switch, size cap and hit/miss statistics |
//! | [`CacheBackend`] | Trait for storage backends |
//! | [`MemoryCache`] | In-process LRU |
//! | [`DiskCache`] | One JSON file per entry; survives restarts |
//! | [`NullCache`] | No-op backend |
//! | [`CacheKeyGenerator`] | SHA-256 keys from [`EnrichmentKeyParts`] |
//!
//! ```rust
//! use ai_enrich::cache::{CacheConfig, CacheManager, MemoryCache};
//! use std::time::Duration;
//!
//! let cache = CacheManager::new(
//!     CacheConfig::new().with_ttl(Duration::from_secs(3600)),
//!     Box::new(MemoryCache::new(1000)),
//! );
//! assert_eq!(cache.backend_name(), "memory");
//! ```

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, DiskCache, MemoryCache, NullCache};
pub use key::{CacheKey, CacheKeyGenerator, EnrichmentKeyParts};
pub use manager::{CacheConfig, CacheManager, CacheStats};
