//! Factories that hand out enricher handles.

use super::enricher::{create_cached_enricher, default_cache_config, Enricher};
use crate::cache::{CacheBackend, CacheConfig, CacheManager, DiskCache, MemoryCache, NullCache};
use crate::config::ProviderSelection;
use crate::transport::TransportConfig;
use crate::Result;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;

/// What an enricher is being built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnricherRequest {
    pub selection: ProviderSelection,
    pub system_prompt: String,
    /// Model name, or deployment name on Azure.
    pub model: String,
}

/// Builds enricher handles for response shape `T`.
pub trait EnricherFactory<T> {
    fn create(&self, request: &EnricherRequest) -> Result<Box<dyn Enricher<T>>>;
}

/// Where enrichment results are cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStore {
    Memory { max_entries: usize },
    Disk(PathBuf),
    Disabled,
}

impl CacheStore {
    /// `ai-enrich-cache` under the system temp directory.
    pub fn default_disk() -> Self {
        CacheStore::Disk(std::env::temp_dir().join("ai-enrich-cache"))
    }

    fn open(&self) -> Result<Box<dyn CacheBackend>> {
        Ok(match self {
            CacheStore::Memory { max_entries } => Box::new(MemoryCache::new(*max_entries)),
            CacheStore::Disk(dir) => Box::new(DiskCache::open(dir.clone())?),
            CacheStore::Disabled => Box::new(NullCache::new()),
        })
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::default_disk()
    }
}

/// Factory producing HTTP-backed [`super::CachedEnricher`]s.
#[derive(Debug, Clone)]
pub struct HttpEnricherFactory {
    pub transport: TransportConfig,
    pub store: CacheStore,
    pub cache: CacheConfig,
}

impl Default for HttpEnricherFactory {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            store: CacheStore::default(),
            cache: default_cache_config(),
        }
    }
}

impl HttpEnricherFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_store(mut self, store: CacheStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

impl<T> EnricherFactory<T> for HttpEnricherFactory
where
    T: Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static,
{
    fn create(&self, request: &EnricherRequest) -> Result<Box<dyn Enricher<T>>> {
        let cache = CacheManager::new(self.cache.clone(), self.store.open()?);
        let enricher = create_cached_enricher::<T>(
            &request.selection,
            &request.system_prompt,
            &request.model,
            &self.transport,
            cache,
        )?;
        Ok(Box::new(enricher))
    }
}
