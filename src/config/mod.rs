//! Credential discovery and provider selection.
//!
//! Environment reads go through [`EnvSource`] so that callers (and tests)
//! decide where values come from.

pub mod env;
pub mod provider;

pub use env::{
    Credentials, EnvSource, MapEnv, Presence, ProcessEnv, AZURE_OPENAI_API_KEY,
    AZURE_OPENAI_ENDPOINT, OPENAI_API_KEY,
};
pub use provider::{select_provider, ProviderKind, ProviderSelection};
