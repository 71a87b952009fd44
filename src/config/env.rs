//! Environment access and the credential probe.

use std::collections::HashMap;

/// Azure OpenAI resource endpoint, e.g. `https://myresource.openai.azure.com`.
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
/// Azure OpenAI API key.
pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
/// OpenAI API key, used when the Azure pair is incomplete.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Read-only source of named configuration values.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of values, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// The three credential values the setup check looks for.
///
/// Empty strings count as unset.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub azure_endpoint: Option<String>,
    pub azure_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    /// Read each credential variable exactly once.
    pub fn probe(env: &dyn EnvSource) -> Self {
        let read = |name: &str| env.var(name).filter(|v| !v.trim().is_empty());
        Self {
            azure_endpoint: read(AZURE_OPENAI_ENDPOINT),
            azure_api_key: read(AZURE_OPENAI_API_KEY),
            openai_api_key: read(OPENAI_API_KEY),
        }
    }

    pub fn presence(&self) -> Presence {
        Presence {
            azure_endpoint: self.azure_endpoint.is_some(),
            azure_api_key: self.azure_api_key.is_some(),
            openai_api_key: self.openai_api_key.is_some(),
        }
    }
}

// Keys must never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("azure_endpoint", &self.azure_endpoint)
            .field("azure_api_key", &mask(&self.azure_api_key))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .finish()
    }
}

/// Presence flags derived from [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub azure_endpoint: bool,
    pub azure_api_key: bool,
    pub openai_api_key: bool,
}

impl Presence {
    /// Human-readable report lines, in fixed order: endpoint, primary key, fallback key.
    pub fn report_lines(&self) -> [String; 3] {
        let mark = |set: bool| if set { "✓" } else { "✗" };
        [
            format!("Azure endpoint: {}", mark(self.azure_endpoint)),
            format!("Azure API key: {}", mark(self.azure_api_key)),
            format!("OpenAI API key: {}", mark(self.openai_api_key)),
        ]
    }
}
