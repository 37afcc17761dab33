//! Completion request/response shapes and provider errors.
//!
//! Modeled on the chat-completions wire format every configured provider
//! speaks, minus the transport details.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Speaker of a message in the conversation window.
///
/// The persona prompt is not a message; it travels in
/// [`CompletionRequest::system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One completion call.
///
/// `messages` is the history window oldest first, with the new user input
/// last. `model` is empty until the fallback chain stamps the attempt's model
/// onto it.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Provider-assigned id; empty when the provider sends none.
    pub id: String,
    pub content: String,
    /// Model that answered, as reported by the provider.
    pub model: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// `choices[0].finish_reason` of a chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Parse the wire value. A missing reason counts as a normal stop.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            None | Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some(other) => FinishReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(reason) => reason,
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Why a provider call failed.
///
/// Every variant is recoverable from the chain's point of view: the next
/// attempt runs regardless of which one occurred.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No HTTP response arrived (DNS, connect, TLS, reading the body).
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 401/403.
    #[error("credential rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    /// HTTP 429.
    #[error("rate limited{}", retry_hint(.retry_after_ms))]
    RateLimited { retry_after_ms: Option<u64> },

    /// HTTP 503/529.
    #[error("provider overloaded: {0}")]
    Overloaded(String),

    /// HTTP 400/404/413/422, e.g. an unknown or decommissioned model.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A success status whose body is not a chat completion.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be set up.
    #[error("client setup failed: {0}")]
    Setup(String),
}

fn retry_hint(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(" (retry after {ms}ms)"),
        None => String::new(),
    }
}

/// One (provider, credential, model, timeout) combination tried against a
/// completion API.
///
/// Built once from configuration, consumed at request time, never mutated.
/// The credential is a [`SecretString`] so the descriptor can be logged with
/// `{:?}` without leaking the key.
#[derive(Debug)]
pub struct ProviderAttempt {
    /// Name used in logs, e.g. "groq".
    pub provider_name: String,
    /// Chat-completions base URL, without `/chat/completions`.
    pub base_url: String,
    pub credential: SecretString,
    /// 1-based position of the credential among the provider's keys.
    pub credential_slot: usize,
    pub model: String,
    /// Upper bound on the whole request, connect through body.
    pub timeout: Duration,
}

impl ProviderAttempt {
    /// Log-safe identity of this attempt: `provider/model#slot`.
    pub fn label(&self) -> String {
        format!("{}/{}#{}", self.provider_name, self.model, self.credential_slot)
    }
}
