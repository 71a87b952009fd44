//! Enrichment: free-text prompt in, validated structured value out.
//!
//! ```rust,no_run
//! use ai_enrich::cache::{CacheManager, MemoryCache};
//! use ai_enrich::config::ProviderSelection;
//! use ai_enrich::enrich::{create_cached_enricher, default_cache_config, Enricher};
//! use ai_enrich::transport::TransportConfig;
//! use schemars::JsonSchema;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize, JsonSchema)]
//! struct Sentiment {
//!     label: String,
//! }
//!
//! # async fn run() -> ai_enrich::Result<()> {
//! let selection = ProviderSelection::OpenAi { api_key: "sk-...".into() };
//! let cache = CacheManager::new(default_cache_config(), Box::new(MemoryCache::new(100)));
//! let enricher = create_cached_enricher::<Sentiment>(
//!     &selection,
//!     "Classify the sentiment of the text.",
//!     "gpt-4o-mini",
//!     &TransportConfig::default(),
//!     cache,
//! )?;
//! let sentiment = enricher.enrich("What a lovely day").await?;
//! println!("{:?}", sentiment);
//! # Ok(())
//! # }
//! ```

mod enricher;
mod factory;

pub use enricher::{create_cached_enricher, default_cache_config, CachedEnricher, Enricher};
pub use factory::{CacheStore, EnricherFactory, EnricherRequest, HttpEnricherFactory};
