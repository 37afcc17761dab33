//! Ordered provider fallback chain.
//!
//! Routes a completion request through a fixed list of provider attempts
//! (credential x model combinations, then backup providers). Attempts are
//! tried strictly in configured order, each bounded by its own timeout. The
//! first non-empty completion wins; every other outcome advances to the next
//! attempt. Nothing is retried, re-ranked, or remembered across requests.

use std::time::{Duration, Instant};

use tracing::{Instrument, info_span};

use hinata_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderAttempt};

use super::box_provider::BoxLlmProvider;
use super::provider::LlmProvider;

/// One entry of the chain: a provider instance plus the attempt identity it
/// was built for.
pub struct ChainAttempt {
    pub provider_name: String,
    pub model: String,
    pub credential_slot: usize,
    pub timeout: Duration,
    provider: BoxLlmProvider,
}

impl ChainAttempt {
    pub fn new(
        provider_name: impl Into<String>,
        model: impl Into<String>,
        credential_slot: usize,
        timeout: Duration,
        provider: BoxLlmProvider,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            model: model.into(),
            credential_slot,
            timeout,
            provider,
        }
    }

    /// Pair a configured attempt with the provider built from it.
    pub fn from_attempt(attempt: &ProviderAttempt, provider: BoxLlmProvider) -> Self {
        Self::new(
            attempt.provider_name.clone(),
            attempt.model.clone(),
            attempt.credential_slot,
            attempt.timeout,
            provider,
        )
    }

    /// Log-safe identity: `provider/model#slot`.
    pub fn label(&self) -> String {
        format!("{}/{}#{}", self.provider_name, self.model, self.credential_slot)
    }
}

impl std::fmt::Debug for ChainAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAttempt")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("credential_slot", &self.credential_slot)
            .field("timeout", &self.timeout)
            .field("provider", &"<provider>")
            .finish()
    }
}

/// Why a single attempt did not produce a deliverable completion.
#[derive(Debug, thiserror::Error)]
pub enum AttemptFailure {
    #[error("timed out after {}ms", after.as_millis())]
    TimedOut { after: Duration },

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

/// Result of a successful completion through the chain.
#[derive(Debug)]
pub struct ChainSuccess {
    /// The completion response from the provider.
    pub response: CompletionResponse,
    /// Name of the provider that handled the request.
    pub provider_name: String,
    /// Model the winning attempt requested.
    pub model: String,
    /// Credential slot of the winning attempt.
    pub credential_slot: usize,
    /// 1-based position of the winning attempt in the chain.
    pub attempt_number: usize,
}

/// Every attempt failed (or there were none).
#[derive(Debug, thiserror::Error)]
#[error("{}", exhausted_message(.failures))]
pub struct ChainExhausted {
    /// `(attempt label, failure)` in the order the attempts were made.
    pub failures: Vec<(String, AttemptFailure)>,
}

fn exhausted_message(failures: &[(String, AttemptFailure)]) -> String {
    if failures.is_empty() {
        "no provider attempts configured".to_string()
    } else {
        format!("all {} provider attempts failed", failures.len())
    }
}

/// Ordered list of provider attempts.
///
/// `complete` takes `&self`: the chain holds no per-request state, so one
/// instance can serve concurrent conversations behind an `Arc`.
#[derive(Debug, Default)]
pub struct FallbackChain {
    attempts: Vec<ChainAttempt>,
}

impl FallbackChain {
    pub fn new(attempts: Vec<ChainAttempt>) -> Self {
        Self { attempts }
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn attempts(&self) -> &[ChainAttempt] {
        &self.attempts
    }

    /// Run one attempt: one request, bounded by the attempt's timeout.
    ///
    /// The request's `model` is replaced with the attempt's model. On timeout
    /// the in-flight request future is dropped.
    pub async fn try_attempt(
        attempt: &ChainAttempt,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AttemptFailure> {
        let mut request = request.clone();
        request.model = attempt.model.clone();

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = %attempt.provider_name,
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            credential_slot = attempt.credential_slot,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
        );

        let call = attempt.provider.complete(&request).instrument(span);
        let response = tokio::time::timeout(attempt.timeout, call)
            .await
            .map_err(|_| AttemptFailure::TimedOut {
                after: attempt.timeout,
            })??;

        if response.content.trim().is_empty() {
            return Err(AttemptFailure::EmptyCompletion);
        }

        Ok(response)
    }

    /// Send a completion request through the chain.
    ///
    /// Tries attempts in order and returns the first non-empty completion.
    /// Failures are logged at `warn` with the attempt identity and collected
    /// into [`ChainExhausted`] if nothing succeeds.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<ChainSuccess, ChainExhausted> {
        let mut failures = Vec::new();

        for (idx, attempt) in self.attempts.iter().enumerate() {
            let start = Instant::now();

            match Self::try_attempt(attempt, request).await {
                Ok(response) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    tracing::debug!(
                        provider = %attempt.provider_name,
                        model = %attempt.model,
                        slot = attempt.credential_slot,
                        latency_ms,
                        "Provider attempt succeeded"
                    );
                    if idx > 0 {
                        tracing::info!(
                            provider = %attempt.provider_name,
                            model = %attempt.model,
                            failed_before = idx,
                            "Reply served by fallback attempt"
                        );
                    }

                    return Ok(ChainSuccess {
                        response,
                        provider_name: attempt.provider_name.clone(),
                        model: attempt.model.clone(),
                        credential_slot: attempt.credential_slot,
                        attempt_number: idx + 1,
                    });
                }
                Err(failure) => {
                    tracing::warn!(
                        provider = %attempt.provider_name,
                        model = %attempt.model,
                        slot = attempt.credential_slot,
                        latency_ms = start.elapsed().as_millis() as u64,
                        error = %failure,
                        "Provider attempt failed, trying next in chain"
                    );
                    failures.push((attempt.label(), failure));
                }
            }
        }

        Err(ChainExhausted { failures })
    }
}
