//! # ai-enrich
//!
//! Cached, schema-constrained enrichment over OpenAI and Azure OpenAI chat
//! completions, plus the `check-setup` tool that verifies a machine's
//! credentials with one live call.
//!
//! ## Overview
//!
//! An *enricher* takes a free-text prompt and returns a value of a Rust type
//! `T`. It derives a strict JSON schema from `T`, asks the model for output in
//! that shape, validates what comes back and caches the result, so repeated
//! prompts never reach the network twice.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_enrich::check::{run_setup_check, CheckOptions};
//! use ai_enrich::config::ProcessEnv;
//! use ai_enrich::enrich::{CacheStore, HttpEnricherFactory};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::io::Result<()> {
//!     let outcome = run_setup_check(
//!         &ProcessEnv,
//!         &CheckOptions::default(),
//!         &HttpEnricherFactory::new().with_store(CacheStore::Disabled),
//!         &mut std::io::stdout(),
//!     )
//!     .await?;
//!     std::process::exit(outcome.exit_code().into());
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Credential probing and provider selection |
//! | [`check`] | The setup check procedure |
//! | [`enrich`] | Enricher trait, cached enricher and factories |
//! | [`structured`] | Schema generation, JSON mode and output validation |
//! | [`cache`] | Result caching with memory and disk backends |
//! | [`transport`] | HTTP client for the Chat Completions endpoints |
//! | [`types`] | Chat request and message types |

pub mod cache;
pub mod check;
pub mod config;
pub mod enrich;
pub mod structured;
pub mod transport;
pub mod types;

pub use check::{run_setup_check, CheckFailure, CheckOptions, CheckOutcome, SetupProbe};
pub use config::{ProviderKind, ProviderSelection};
pub use enrich::{create_cached_enricher, CachedEnricher, Enricher, EnricherFactory};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
