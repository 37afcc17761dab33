//! Response engine for Hinata.
//!
//! `ResponseEngine::respond` turns one inbound user message into one reply:
//! record the user turn, read bounded history, compose the prompt, walk the
//! fallback chain, and record the assistant turn on success. It never fails;
//! every error path ends in an in-persona string.

use hinata_types::config::HinataConfig;
use hinata_types::conversation::{ConversationId, TurnRole};
use serde::Serialize;
use tracing::{Instrument, info_span};

use crate::llm::fallback::FallbackChain;

use super::prompt::{assemble_request, select_history};
use super::repository::ConversationRepository;
use super::store::ConversationStore;

/// The subset of configuration the engine reads per request.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub persona_prompt: String,
    pub fallback_reply: String,
    pub missing_credentials_reply: String,
    pub history_window: usize,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl EngineSettings {
    pub fn from_config(config: &HinataConfig) -> Self {
        Self {
            persona_prompt: config.persona_prompt.clone(),
            fallback_reply: config.fallback_reply.clone(),
            missing_credentials_reply: config.missing_credentials_reply.clone(),
            history_window: config.history_window,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&HinataConfig::default())
    }
}

/// Where a reply's text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
    /// A provider attempt produced the text.
    Generated {
        provider_name: String,
        model: String,
        credential_slot: usize,
    },
    /// Every attempt failed; the text is the fixed apology.
    Fallback,
    /// No attempt was configured; the text is the "keys missing" reply.
    MissingCredentials,
}

/// Reply to one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    pub fn is_generated(&self) -> bool {
        matches!(self.source, ReplySource::Generated { .. })
    }
}

/// Produces replies from conversation memory and an ordered provider chain.
///
/// Holds no per-request state; share it across tasks with `Arc`. Two
/// concurrent `respond` calls for the same conversation may interleave their
/// reads and writes.
pub struct ResponseEngine<R: ConversationRepository> {
    store: ConversationStore<R>,
    chain: FallbackChain,
    settings: EngineSettings,
}

impl<R: ConversationRepository> ResponseEngine<R> {
    pub fn new(
        store: ConversationStore<R>,
        chain: FallbackChain,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            chain,
            settings,
        }
    }

    pub fn store(&self) -> &ConversationStore<R> {
        &self.store
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Answer one user message.
    pub async fn respond(&self, conversation_id: &ConversationId, user_text: &str) -> Reply {
        let span = info_span!(
            "hinata.respond",
            conversation = %conversation_id,
            attempts = self.chain.len(),
        );
        self.respond_inner(conversation_id, user_text)
            .instrument(span)
            .await
    }

    async fn respond_inner(&self, conversation_id: &ConversationId, user_text: &str) -> Reply {
        let window = self.settings.history_window;

        let user_turn = self
            .store
            .append(conversation_id, TurnRole::User, user_text)
            .await;

        // One extra row so the window stays full after dropping the turn above.
        let stored = self
            .store
            .recent(conversation_id, window.saturating_add(1))
            .await;
        let history = select_history(stored, user_turn.map(|t| t.id), window);

        tracing::debug!(history_turns = history.len(), "Assembled conversation window");

        if self.chain.is_empty() {
            tracing::warn!("No provider credentials configured, replying without a completion");
            return Reply {
                text: self.settings.missing_credentials_reply.clone(),
                source: ReplySource::MissingCredentials,
            };
        }

        let request = assemble_request(
            &self.settings.persona_prompt,
            &history,
            user_text,
            self.settings.max_tokens,
            self.settings.temperature,
        );

        match self.chain.complete(&request).await {
            Ok(success) => {
                let text = success.response.content.trim().to_string();
                self.store
                    .append(conversation_id, TurnRole::Assistant, &text)
                    .await;

                tracing::info!(
                    provider = %success.provider_name,
                    model = %success.model,
                    slot = success.credential_slot,
                    attempt = success.attempt_number,
                    output_tokens = success.response.usage.output_tokens,
                    "Reply generated"
                );

                Reply {
                    text,
                    source: ReplySource::Generated {
                        provider_name: success.provider_name,
                        model: success.model,
                        credential_slot: success.credential_slot,
                    },
                }
            }
            Err(exhausted) => {
                let tried: Vec<&str> = exhausted.failures.iter().map(|(l, _)| l.as_str()).collect();
                tracing::error!(
                    error = %exhausted,
                    tried = ?tried,
                    "Every provider attempt failed, sending fallback reply"
                );
                Reply {
                    text: self.settings.fallback_reply.clone(),
                    source: ReplySource::Fallback,
                }
            }
        }
    }
}
