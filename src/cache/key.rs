//! Cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
    pub model: Option<String>,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), model: None }
    }
    pub fn with_model(mut self, model: impl Into<String>) -> Self { self.model = Some(model.into()); self }
    pub fn as_str(&self) -> &str { &self.hash }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.hash) }
}

impl From<&str> for CacheKey { fn from(s: &str) -> Self { Self::new(s) } }

/// Everything that determines an enrichment result.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentKeyParts<'a> {
    /// Backend identity (provider, endpoint, credential fingerprint).
    pub scope: &'a str,
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub schema_name: &'a str,
    pub schema: &'a serde_json::Value,
    pub prompt: &'a str,
    pub temperature: Option<f32>,
}

pub struct CacheKeyGenerator {
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self { Self { salt: None } }
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self { self.salt = Some(salt.into()); self }

    pub fn generate(&self, parts: &EnrichmentKeyParts<'_>) -> CacheKey {
        let mut canonical: BTreeMap<&str, String> = BTreeMap::new();
        canonical.insert("scope", parts.scope.to_string());
        canonical.insert("model", parts.model.to_string());
        canonical.insert("system_prompt", parts.system_prompt.to_string());
        canonical.insert("schema_name", parts.schema_name.to_string());
        // serde_json maps are sorted, so the schema serializes deterministically.
        canonical.insert("schema", parts.schema.to_string());
        canonical.insert("prompt", parts.prompt.to_string());
        if let Some(t) = parts.temperature { canonical.insert("temperature", format!("{:.2}", t)); }
        if let Some(ref s) = self.salt { canonical.insert("salt", s.clone()); }

        let encoded = serde_json::to_string(&canonical).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(encoded.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        CacheKey::new(hash).with_model(parts.model)
    }
}

impl Default for CacheKeyGenerator { fn default() -> Self { Self::new() } }
