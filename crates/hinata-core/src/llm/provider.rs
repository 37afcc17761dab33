//! LlmProvider trait definition.
//!
//! This is the core abstraction that all completion backends implement.
//! Uses RPITIT for `complete`; `BoxLlmProvider` erases the type when a
//! heterogeneous list of providers is needed.

use hinata_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Groq, Gemini, any OpenAI-compatible API).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Implementations live in hinata-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "groq", "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    ///
    /// Implementations make exactly one request. Retrying is the caller's
    /// decision, and the fallback chain never retries.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
