//! Setup check: probe credentials, pick a provider, and run one live enrichment.
//!
//! Progress is written line by line to the supplied writer so the operator
//! sees which step is running before the (blocking) network call.

use crate::config::{select_provider, Credentials, EnvSource, ProviderKind, ProviderSelection};
use crate::enrich::{EnricherFactory, EnricherRequest};
use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tracing::{debug, info};

/// Placeholder model; on Azure this must be the name of a deployment.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Respond with a simple test message.";
pub const DEFAULT_PROMPT: &str = "Say hello";

/// Shape the test enrichment must come back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SetupProbe {
    pub message: String,
    pub status: String,
}

impl std::fmt::Display for SetupProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "message='{}' status='{}'", self.message, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

/// Why a check did not pass.
#[derive(Debug, thiserror::Error)]
pub enum CheckFailure {
    #[error("no usable credentials found")]
    MissingCredentials,

    #[error("could not create enricher: {0}")]
    Construction(#[source] Error),

    #[error("enrichment call failed: {0}")]
    Invocation(#[source] Error),
}

impl CheckFailure {
    /// The underlying error, for construction and invocation failures.
    pub fn error(&self) -> Option<&Error> {
        match self {
            CheckFailure::MissingCredentials => None,
            CheckFailure::Construction(e) | CheckFailure::Invocation(e) => Some(e),
        }
    }
}

#[derive(Debug)]
pub enum CheckOutcome {
    Passed {
        provider: ProviderKind,
        response: SetupProbe,
    },
    Failed(CheckFailure),
}

impl CheckOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckOutcome::Passed { .. })
    }

    /// Process exit code: 0 on success, 1 on any failure.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Probe, select and, if a provider was found, run the smoke test.
pub async fn run_setup_check<W: Write>(
    env: &dyn EnvSource,
    options: &CheckOptions,
    factory: &dyn EnricherFactory<SetupProbe>,
    out: &mut W,
) -> io::Result<CheckOutcome> {
    writeln!(out, "Testing Azure OpenAI setup...")?;

    let credentials = Credentials::probe(env);
    for line in credentials.presence().report_lines() {
        writeln!(out, "{}", line)?;
    }

    let Some(selection) = select_provider(&credentials) else {
        writeln!(
            out,
            "No API keys found. Please set either Azure or OpenAI credentials."
        )?;
        return Ok(CheckOutcome::Failed(CheckFailure::MissingCredentials));
    };
    writeln!(out, "Using {}", selection.kind())?;
    info!(provider = selection.kind().id(), model = %options.model, "provider selected");

    run_smoke_test(selection, options, factory, out).await
}

/// Build one enricher and issue one enrichment call.
pub async fn run_smoke_test<W: Write>(
    selection: ProviderSelection,
    options: &CheckOptions,
    factory: &dyn EnricherFactory<SetupProbe>,
    out: &mut W,
) -> io::Result<CheckOutcome> {
    let provider = selection.kind();
    let request = EnricherRequest {
        selection,
        system_prompt: options.system_prompt.clone(),
        model: options.model.clone(),
    };

    let enricher = match factory.create(&request) {
        Ok(enricher) => enricher,
        Err(e) => return report_failure(out, CheckFailure::Construction(e)),
    };
    writeln!(out, "✓ Enricher created successfully")?;

    match enricher.enrich(&options.prompt).await {
        Ok(response) => {
            writeln!(out, "✓ Test enrichment successful: {}", response)?;
            debug!(?response, "setup check passed");
            Ok(CheckOutcome::Passed { provider, response })
        }
        Err(e) => report_failure(out, CheckFailure::Invocation(e)),
    }
}

fn report_failure<W: Write>(out: &mut W, failure: CheckFailure) -> io::Result<CheckOutcome> {
    if let Some(e) = failure.error() {
        writeln!(out, "✗ Error testing enricher: {}", e)?;
    }
    Ok(CheckOutcome::Failed(failure))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_display() {
        let probe = SetupProbe {
            message: "Hello!".into(),
            status: "success".into(),
        };
        assert_eq!(probe.to_string(), "message='Hello!' status='success'");
    }

    #[test]
    fn test_exit_codes() {
        let passed = CheckOutcome::Passed {
            provider: ProviderKind::OpenAi,
            response: SetupProbe {
                message: "hi".into(),
                status: "ok".into(),
            },
        };
        assert_eq!(passed.exit_code(), 0);
        assert_eq!(
            CheckOutcome::Failed(CheckFailure::MissingCredentials).exit_code(),
            1
        );
        let construction = CheckFailure::Construction(Error::configuration("bad endpoint"));
        assert!(construction.error().is_some());
        assert_eq!(CheckOutcome::Failed(construction).exit_code(), 1);
    }

    #[test]
    fn test_default_options() {
        let options = CheckOptions::default().with_model("my-deployment");
        assert_eq!(options.model, "my-deployment");
        assert_eq!(options.prompt, DEFAULT_PROMPT);
        assert_eq!(options.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }
}
