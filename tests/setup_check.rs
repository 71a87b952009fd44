//! Setup check behaviour against a fake enricher factory.
//!
//! No network: the factory records what it was asked to build and hands out
//! enrichers with scripted results.

use ai_enrich::check::{run_setup_check, CheckFailure, CheckOptions, CheckOutcome, SetupProbe};
use ai_enrich::config::{
    MapEnv, ProviderKind, ProviderSelection, AZURE_OPENAI_API_KEY, AZURE_OPENAI_ENDPOINT,
    OPENAI_API_KEY,
};
use ai_enrich::enrich::{Enricher, EnricherFactory, EnricherRequest};
use ai_enrich::{Error, Result};
use async_trait::async_trait;
use std::cell::RefCell;

#[derive(Clone)]
enum Script {
    Reply(SetupProbe),
    FailConstruction(&'static str),
    FailInvocation(u16, &'static str),
}

struct FakeFactory {
    script: Script,
    requests: RefCell<Vec<EnricherRequest>>,
}

impl FakeFactory {
    fn new(script: Script) -> Self {
        Self {
            script,
            requests: RefCell::new(Vec::new()),
        }
    }

    fn replying_hello() -> Self {
        Self::new(Script::Reply(SetupProbe {
            message: "Hello!".into(),
            status: "success".into(),
        }))
    }

    fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

struct FakeEnricher {
    script: Script,
}

#[async_trait]
impl Enricher<SetupProbe> for FakeEnricher {
    async fn enrich(&self, _prompt: &str) -> Result<SetupProbe> {
        match &self.script {
            Script::Reply(probe) => Ok(probe.clone()),
            Script::FailInvocation(status, message) => Err(Error::remote(*status, *message)),
            Script::FailConstruction(_) => unreachable!("construction already failed"),
        }
    }
}

impl EnricherFactory<SetupProbe> for FakeFactory {
    fn create(&self, request: &EnricherRequest) -> Result<Box<dyn Enricher<SetupProbe>>> {
        self.requests.borrow_mut().push(request.clone());
        match &self.script {
            Script::FailConstruction(message) => Err(Error::configuration(*message)),
            script => Ok(Box::new(FakeEnricher {
                script: script.clone(),
            })),
        }
    }
}

fn azure_env() -> MapEnv {
    MapEnv::new()
        .with_var(AZURE_OPENAI_ENDPOINT, "https://res.openai.azure.com")
        .with_var(AZURE_OPENAI_API_KEY, "azure-key")
}

async fn run(env: &MapEnv, factory: &FakeFactory) -> (CheckOutcome, String) {
    let mut out = Vec::new();
    let outcome = run_setup_check(env, &CheckOptions::default(), factory, &mut out)
        .await
        .unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn azure_credentials_select_azure_and_pass() {
    let factory = FakeFactory::replying_hello();
    let (outcome, output) = run(&azure_env(), &factory).await;

    assert_eq!(
        output,
        "Testing Azure OpenAI setup...\n\
         Azure endpoint: ✓\n\
         Azure API key: ✓\n\
         OpenAI API key: ✗\n\
         Using Azure OpenAI\n\
         ✓ Enricher created successfully\n\
         ✓ Test enrichment successful: message='Hello!' status='success'\n"
    );
    assert!(matches!(
        outcome,
        CheckOutcome::Passed { provider: ProviderKind::AzureOpenAi, .. }
    ));
    assert_eq!(outcome.exit_code(), 0);

    let requests = factory.requests.borrow();
    assert_eq!(
        requests[0].selection,
        ProviderSelection::AzureOpenAi {
            endpoint: "https://res.openai.azure.com".into(),
            api_key: "azure-key".into(),
        }
    );
    assert_eq!(requests[0].model, "gpt-4o-mini");
    assert_eq!(
        requests[0].system_prompt,
        "You are a helpful assistant. Respond with a simple test message."
    );
}

#[tokio::test]
async fn openai_key_alone_selects_openai() {
    let env = MapEnv::new().with_var(OPENAI_API_KEY, "sk-test");
    let factory = FakeFactory::replying_hello();
    let (outcome, output) = run(&env, &factory).await;

    assert!(output.contains("Azure endpoint: ✗\nAzure API key: ✗\nOpenAI API key: ✓\n"));
    assert!(output.contains("Using OpenAI\n"));
    assert!(matches!(
        outcome,
        CheckOutcome::Passed { provider: ProviderKind::OpenAi, .. }
    ));
    assert_eq!(factory.calls(), 1);
}

#[tokio::test]
async fn azure_pair_wins_over_openai_key() {
    let env = azure_env().with_var(OPENAI_API_KEY, "sk-test");
    let factory = FakeFactory::replying_hello();
    let (_, output) = run(&env, &factory).await;

    assert!(output.contains("Using Azure OpenAI\n"));
    assert_eq!(
        factory.requests.borrow()[0].selection.kind(),
        ProviderKind::AzureOpenAi
    );
}

#[tokio::test]
async fn missing_credentials_fail_without_calling_factory() {
    let factory = FakeFactory::replying_hello();
    let (outcome, output) = run(&MapEnv::new(), &factory).await;

    assert!(output.ends_with(
        "OpenAI API key: ✗\nNo API keys found. Please set either Azure or OpenAI credentials.\n"
    ));
    assert!(!output.contains("Enricher"));
    assert!(matches!(
        outcome,
        CheckOutcome::Failed(CheckFailure::MissingCredentials)
    ));
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(factory.calls(), 0);
}

#[tokio::test]
async fn endpoint_without_key_is_not_enough() {
    let env = MapEnv::new().with_var(AZURE_OPENAI_ENDPOINT, "https://res.openai.azure.com");
    let factory = FakeFactory::replying_hello();
    let (outcome, _) = run(&env, &factory).await;

    assert!(matches!(
        outcome,
        CheckOutcome::Failed(CheckFailure::MissingCredentials)
    ));
    assert_eq!(factory.calls(), 0);
}

#[tokio::test]
async fn construction_failure_is_reported() {
    let factory = FakeFactory::new(Script::FailConstruction("invalid Azure OpenAI endpoint"));
    let (outcome, output) = run(&azure_env(), &factory).await;

    assert!(output.ends_with(
        "Using Azure OpenAI\n✗ Error testing enricher: Configuration error: invalid Azure OpenAI endpoint\n"
    ));
    assert!(!output.contains("Enricher created"));
    assert!(matches!(
        outcome,
        CheckOutcome::Failed(CheckFailure::Construction(_))
    ));
    assert_eq!(outcome.exit_code(), 1);
}

#[tokio::test]
async fn invocation_failure_is_reported() {
    let factory = FakeFactory::new(Script::FailInvocation(401, "Incorrect API key provided"));
    let env = MapEnv::new().with_var(OPENAI_API_KEY, "sk-wrong");
    let (outcome, output) = run(&env, &factory).await;

    assert!(output.contains("✓ Enricher created successfully\n"));
    assert!(output.contains(
        "✗ Error testing enricher: Remote error: HTTP 401 (authentication): Incorrect API key provided\n"
    ));
    match outcome {
        CheckOutcome::Failed(CheckFailure::Invocation(Error::Remote { status, .. })) => {
            assert_eq!(status, 401)
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn model_is_taken_from_options() {
    let factory = FakeFactory::replying_hello();
    let options = CheckOptions::new().with_model("my-gpt4o-deployment");
    let mut out = Vec::new();
    run_setup_check(&azure_env(), &options, &factory, &mut out)
        .await
        .unwrap();

    assert_eq!(factory.requests.borrow()[0].model, "my-gpt4o-deployment");
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let env = MapEnv::new().with_var(OPENAI_API_KEY, "sk-test");
    let factory = FakeFactory::replying_hello();

    let (first, first_output) = run(&env, &factory).await;
    let (second, second_output) = run(&env, &factory).await;

    assert_eq!(first_output, second_output);
    assert_eq!(first.exit_code(), second.exit_code());
    assert_eq!(factory.calls(), 2);
}
