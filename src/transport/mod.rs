//! HTTP transport to the Chat Completions endpoints.

mod http;

pub use http::{HttpTransport, TransportConfig, DEFAULT_AZURE_API_VERSION, DEFAULT_OPENAI_BASE_URL};

use crate::config::ProviderKind;
use crate::types::ChatRequest;
use crate::Result;
use async_trait::async_trait;

/// Something that can answer a chat-completion request with the raw content
/// of the first choice.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;

    fn provider(&self) -> ProviderKind;

    /// Identifies who answers: cached results are only shared between
    /// backends with the same scope.
    fn cache_scope(&self) -> String {
        self.provider().id().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
