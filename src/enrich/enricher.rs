//! The cached, schema-constrained enricher.

use crate::cache::{CacheConfig, CacheKeyGenerator, CacheManager, CacheStats, EnrichmentKeyParts};
use crate::config::ProviderSelection;
use crate::structured::{
    json_schema_from_type, schema_name_for, strict_schema, JsonModeConfig, OutputValidator,
    StructuredOutput,
};
use crate::transport::{CompletionBackend, HttpTransport, TransportConfig};
use crate::types::{ChatRequest, Message};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Turns a free-text prompt into a value of type `T`.
#[async_trait]
pub trait Enricher<T>: Send + Sync {
    async fn enrich(&self, prompt: &str) -> Result<T>;
}

/// Enricher that asks a chat-completion backend for JSON matching `T`'s
/// schema and caches validated results.
pub struct CachedEnricher<T> {
    backend: Box<dyn CompletionBackend>,
    cache: CacheManager,
    keys: CacheKeyGenerator,
    system_prompt: String,
    model: String,
    temperature: Option<f32>,
    json_mode: JsonModeConfig,
    validator: OutputValidator,
    _shape: PhantomData<fn() -> T>,
}

impl<T> CachedEnricher<T>
where
    T: Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static,
{
    pub fn new(
        backend: Box<dyn CompletionBackend>,
        cache: CacheManager,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model/deployment name must not be empty",
                ErrorContext::new().with_field_path("model").with_source("cached_enricher"),
            ));
        }

        let schema = strict_schema(json_schema_from_type::<T>()?);
        let validator = OutputValidator::new(schema.clone())?;
        let json_mode = JsonModeConfig::from_schema(schema, schema_name_for::<T>(), true);

        Ok(Self {
            backend,
            cache,
            keys: CacheKeyGenerator::new(),
            system_prompt: system_prompt.into(),
            model,
            temperature: None,
            json_mode,
            validator,
            _shape: PhantomData,
        })
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_key_generator(mut self, keys: CacheKeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn build_request(&self, prompt: &str) -> Result<ChatRequest> {
        Ok(ChatRequest::new(
            self.model.clone(),
            vec![Message::system(self.system_prompt.clone()), Message::user(prompt)],
        )
        .with_temperature(self.temperature)
        .with_response_format(self.json_mode.to_response_format()?))
    }
}

#[async_trait]
impl<T> Enricher<T> for CachedEnricher<T>
where
    T: Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static,
{
    async fn enrich(&self, prompt: &str) -> Result<T> {
        let null_schema = serde_json::Value::Null;
        let scope = self.backend.cache_scope();
        let key = self.keys.generate(&EnrichmentKeyParts {
            scope: &scope,
            model: &self.model,
            system_prompt: &self.system_prompt,
            schema_name: &self.json_mode.schema_name,
            schema: self.json_mode.schema.as_ref().unwrap_or(&null_schema),
            prompt,
            temperature: self.temperature,
        });

        match self.cache.get::<T>(&key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "cache read failed, calling the model"),
        }

        let request = self.build_request(prompt)?;
        let raw = self.backend.complete(&request).await?;
        debug!(bytes = raw.len(), "received completion");

        let value: T = StructuredOutput::from_response(raw, &self.validator).into_typed()?;

        if let Err(e) = self.cache.set(&key, &value).await {
            warn!(error = %e, "failed to store enrichment result in cache");
        }
        Ok(value)
    }
}

/// Build a [`CachedEnricher`] for `T` talking to the selected provider over HTTP.
///
/// On Azure `model` is the deployment name.
pub fn create_cached_enricher<T>(
    selection: &ProviderSelection,
    system_prompt: &str,
    model: &str,
    transport: &TransportConfig,
    cache: CacheManager,
) -> Result<CachedEnricher<T>>
where
    T: Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static,
{
    let backend = HttpTransport::new(selection, model.trim(), transport)?;
    debug!(transport = ?backend, cache = cache.backend_name(), "creating cached enricher");
    CachedEnricher::new(Box::new(backend), cache, system_prompt, model.trim())
}

/// Default cache settings used by [`create_cached_enricher`] callers that do not care.
pub fn default_cache_config() -> CacheConfig {
    CacheConfig::new().with_key_prefix("enrich")
}
