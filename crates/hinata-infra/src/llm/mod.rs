//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`] trait
//! defined in `hinata-core`, a factory that turns each configured
//! [`ProviderAttempt`] into a provider ([`create_provider`]), and
//! [`build_chain`], which assembles the whole fallback chain from config.
//!
//! [`LlmProvider`]: hinata_core::llm::provider::LlmProvider

pub mod openai_compat;

use hinata_core::llm::box_provider::BoxLlmProvider;
use hinata_core::llm::fallback::{AttemptFailure, ChainAttempt, FallbackChain};
use hinata_core::llm::plan::build_attempt_plan;
use hinata_types::config::HinataConfig;
use hinata_types::llm::{CompletionRequest, LlmError, Message, MessageRole, ProviderAttempt};

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create the HTTP client shared by every provider in a chain.
pub fn http_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .user_agent(concat!("hinata/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LlmError::Setup(e.to_string()))
}

/// Create a [`BoxLlmProvider`] for one attempt.
///
/// The provider also carries the attempt's timeout at the HTTP layer, so a
/// stalled connection is torn down even outside the chain.
pub fn create_provider(attempt: &ProviderAttempt, client: reqwest::Client) -> BoxLlmProvider {
    let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_attempt(attempt), client)
        .with_request_timeout(attempt.timeout);
    BoxLlmProvider::new(provider)
}

/// Build the fallback chain described by `config`.
///
/// An empty chain (no credentials) is not an error; the engine answers with
/// the missing-credentials reply instead.
pub fn build_chain(config: &HinataConfig) -> Result<FallbackChain, LlmError> {
    let plan = build_attempt_plan(config);
    if plan.is_empty() {
        tracing::warn!("No provider credentials configured; set GROQ_API_KEY");
        return Ok(FallbackChain::default());
    }

    let client = http_client()?;
    let attempts = plan
        .iter()
        .map(|attempt| {
            let provider = create_provider(attempt, client.clone());
            ChainAttempt::from_attempt(attempt, provider)
        })
        .collect::<Vec<_>>();

    tracing::debug!(attempts = attempts.len(), "Built provider fallback chain");
    Ok(FallbackChain::new(attempts))
}

/// Test provider connectivity by sending a minimal completion request.
///
/// Used by `hinata providers --check` to verify each key/model pair. Sends a
/// tiny "Hello" message with a minimal token budget. The failure keeps its
/// kind so callers can tell a timeout from a rejected key.
pub async fn test_provider_connection(attempt: &ChainAttempt) -> Result<(), AttemptFailure> {
    let request = CompletionRequest {
        model: String::new(),
        messages: vec![Message::new(MessageRole::User, "Hello")],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
    };
    FallbackChain::try_attempt(attempt, &request).await.map(|_| ())
}
