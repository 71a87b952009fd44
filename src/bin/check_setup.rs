//! check-setup: verify OpenAI / Azure OpenAI credentials with one live enrichment.
//!
//! Usage:
//!   AZURE_OPENAI_ENDPOINT=... AZURE_OPENAI_API_KEY=... check-setup
//! or:
//!   OPENAI_API_KEY=... check-setup
//!
//! On Azure, the model name below must match one of your deployments.
//! Diagnostic logs go to stderr and are controlled with RUST_LOG.

use ai_enrich::check::{run_setup_check, CheckOptions, DEFAULT_MODEL};
use ai_enrich::config::ProcessEnv;
use ai_enrich::enrich::{CacheStore, HttpEnricherFactory};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("warning: logging disabled: {}", e);
    }

    // Change DEFAULT_MODEL to your deployment name when using Azure.
    let options = CheckOptions::new().with_model(DEFAULT_MODEL);
    // Every run must reach the provider, so nothing is served from cache.
    let factory = HttpEnricherFactory::new().with_store(CacheStore::Disabled);
    let mut stdout = std::io::stdout().lock();

    match run_setup_check(&ProcessEnv, &options, &factory, &mut stdout).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("failed to write report: {}", e);
            ExitCode::FAILURE
        }
    }
}
