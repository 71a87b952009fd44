use super::CompletionBackend;
use crate::config::{ProviderKind, ProviderSelection, AZURE_OPENAI_ENDPOINT};
use crate::types::ChatRequest;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Azure OpenAI API version that supports `json_schema` response formats.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Whole-request timeout; `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    pub azure_api_version: String,
    pub openai_base_url: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            azure_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_azure_api_version(mut self, version: impl Into<String>) -> Self {
        self.azure_api_version = version.into();
        self
    }

    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into();
        self
    }
}

enum Auth {
    Bearer(String),
    ApiKeyHeader(String),
}

impl Auth {
    fn key(&self) -> &str {
        match self {
            Auth::Bearer(key) | Auth::ApiKeyHeader(key) => key,
        }
    }
}

/// First 8 bytes of the key's SHA-256, hex encoded.
fn key_fingerprint(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Chat Completions client for one provider and one model/deployment.
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    auth: Auth,
    provider: ProviderKind,
}

impl HttpTransport {
    pub fn new(selection: &ProviderSelection, model: &str, config: &TransportConfig) -> Result<Self> {
        let (url, auth) = match selection {
            ProviderSelection::AzureOpenAi { endpoint, api_key } => (
                azure_completions_url(endpoint, model, &config.azure_api_version)?,
                Auth::ApiKeyHeader(api_key.clone()),
            ),
            ProviderSelection::OpenAi { api_key } => (
                openai_completions_url(&config.openai_base_url)?,
                Auth::Bearer(api_key.clone()),
            ),
        };

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(super::TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            url,
            auth,
            provider: selection.kind(),
        })
    }

    pub fn completions_url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("provider", &self.provider)
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

fn azure_completions_url(endpoint: &str, deployment: &str, api_version: &str) -> Result<Url> {
    let context = || {
        ErrorContext::new()
            .with_field_path(AZURE_OPENAI_ENDPOINT)
            .with_source("http_transport")
    };
    let mut url = Url::parse(endpoint.trim()).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid Azure OpenAI endpoint '{}': {}", endpoint, e),
            context(),
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::configuration_with_context(
            format!("Azure OpenAI endpoint must be http(s), got '{}'", url.scheme()),
            context(),
        ));
    }
    url.path_segments_mut()
        .map_err(|_| {
            Error::configuration_with_context("Azure OpenAI endpoint cannot be a base URL", context())
        })?
        .pop_if_empty()
        .extend(["openai", "deployments", deployment, "chat", "completions"]);
    url.set_query(None);
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

fn openai_completions_url(base_url: &str) -> Result<Url> {
    let context = || {
        ErrorContext::new()
            .with_field_path("openai_base_url")
            .with_source("http_transport")
    };
    let mut url = Url::parse(base_url).map_err(|e| {
        Error::configuration_with_context(format!("invalid OpenAI base URL: {}", e), context())
    })?;
    url.path_segments_mut()
        .map_err(|_| Error::configuration_with_context("OpenAI base URL cannot be a base URL", context()))?
        .pop_if_empty()
        .extend(["v1", "chat", "completions"]);
    Ok(url)
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl CompletionBackend for HttpTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        debug!(
            provider = self.provider.id(),
            url = %self.url,
            model = %request.model,
            "sending chat completion request"
        );

        let req = self.client.post(self.url.clone()).json(request);
        let req = match &self.auth {
            Auth::Bearer(key) => req.bearer_auth(key),
            Auth::ApiKeyHeader(key) => req.header("api-key", key),
        };

        let response = req.send().await.map_err(super::TransportError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(super::TransportError::Http)?;

        if !status.is_success() {
            return Err(Error::remote(status.as_u16(), remote_error_message(&body)));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            Error::runtime_with_context(
                "completion response contained no choices",
                ErrorContext::new().with_field_path("choices"),
            )
        })?;

        if let Some(refusal) = choice.message.refusal {
            return Err(Error::runtime_with_context(
                format!("model refused the request: {}", refusal),
                ErrorContext::new().with_field_path("choices[0].message.refusal"),
            ));
        }

        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                Error::runtime_with_context(
                    "completion response had empty content",
                    ErrorContext::new().with_field_path("choices[0].message.content"),
                )
            })
    }

    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn cache_scope(&self) -> String {
        format!("{}|{}|{}", self.provider.id(), self.url, key_fingerprint(self.auth.key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_url_shape() {
        let url = azure_completions_url("https://myresource.openai.azure.com/", "gpt-4o", "2024-10-21")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://myresource.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-10-21"
        );
    }

    #[test]
    fn test_azure_url_rejects_garbage_endpoint() {
        let err = azure_completions_url("not a url", "gpt-4o", "2024-10-21").unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_ENDPOINT"));

        let err = azure_completions_url("ftp://example.com", "gpt-4o", "2024-10-21").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_openai_url_shape() {
        let url = openai_completions_url(DEFAULT_OPENAI_BASE_URL).unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_remote_error_message_extraction() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(remote_error_message(body), "Incorrect API key provided");
        assert_eq!(remote_error_message("  upstream down \n"), "upstream down");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let selection = ProviderSelection::OpenAi {
            api_key: "sk-very-secret".into(),
        };
        let transport = HttpTransport::new(&selection, "gpt-4o-mini", &TransportConfig::default()).unwrap();
        let rendered = format!("{:?}", transport);
        assert!(!rendered.contains("sk-very-secret"));
        assert_eq!(transport.provider(), ProviderKind::OpenAi);
    }

    #[test]
    fn test_cache_scope_tracks_endpoint_and_key() {
        let config = TransportConfig::default();
        let scope = |selection: ProviderSelection| {
            HttpTransport::new(&selection, "gpt-4o-mini", &config)
                .unwrap()
                .cache_scope()
        };
        let good = scope(ProviderSelection::OpenAi { api_key: "sk-good".into() });

        assert_eq!(good, scope(ProviderSelection::OpenAi { api_key: "sk-good".into() }));
        assert_ne!(good, scope(ProviderSelection::OpenAi { api_key: "sk-revoked".into() }));
        assert!(!good.contains("sk-good"));

        let azure = |endpoint: &str| {
            scope(ProviderSelection::AzureOpenAi {
                endpoint: endpoint.into(),
                api_key: "sk-good".into(),
            })
        };
        assert!(azure("https://a.openai.azure.com").starts_with("azure_openai|"));
        assert_ne!(azure("https://a.openai.azure.com"), azure("https://b.openai.azure.com"));
    }
}
