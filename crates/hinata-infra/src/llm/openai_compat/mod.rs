//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] serves Groq, Google Gemini's
//! OpenAI-compatible endpoint, and any other gateway that speaks
//! `POST /chat/completions`, via configurable base URLs.
//!
//! Each `complete` call is exactly one HTTP request. There is no client-side
//! retry or backoff; the fallback chain decides what happens next.

pub mod config;
pub mod types;

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};

use hinata_core::llm::provider::LlmProvider;
use hinata_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
};
use hinata_types::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmError, Usage};

use self::config::OpenAiCompatConfig;
use self::types::{ApiErrorEnvelope, ChatCompletionBody, ChatCompletionResponse, ChatMessage};

/// Unified provider for any OpenAI-compatible API.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// building the `Authorization` header. The type does not implement `Debug`.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    provider_name: String,
    base_url: String,
    api_key: SecretString,
    model: String,
    request_timeout: Option<Duration>,
}

impl OpenAiCompatibleProvider {
    /// Create a provider sharing an existing HTTP client.
    pub fn new(config: OpenAiCompatConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            provider_name: config.provider_name,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
            request_timeout: None,
        }
    }

    /// Bound every request at the HTTP layer as well.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build the wire body from a generic [`CompletionRequest`].
    ///
    /// The persona goes first as a `system` message.
    fn build_body(&self, request: &CompletionRequest) -> ChatCompletionBody {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        // Use the model from the request if set, otherwise fall back to config default
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        ChatCompletionBody {
            model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

// OpenAiCompatibleProvider intentionally does NOT derive Debug.

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_body(request);

        let mut builder = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), retry_after_ms, &error_body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let completion = into_completion(parsed, &body.model)?;

        let span = tracing::Span::current();
        span.record(GEN_AI_USAGE_INPUT_TOKENS, completion.usage.input_tokens);
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, completion.usage.output_tokens);
        span.record(GEN_AI_RESPONSE_FINISH_REASONS, completion.finish_reason.as_str());

        Ok(completion)
    }
}

// ---------------------------------------------------------------------------
// Response mapping
// ---------------------------------------------------------------------------

/// Map a non-2xx status to an [`LlmError`].
fn map_status(status: u16, retry_after_ms: Option<u64>, body: &str) -> LlmError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        401 | 403 => LlmError::Unauthorized { status },
        429 => LlmError::RateLimited { retry_after_ms },
        400 | 404 | 413 | 422 => LlmError::Rejected { status, message },
        503 | 529 => LlmError::Overloaded(message),
        _ => LlmError::Status { status, message },
    }
}

/// `Retry-After` in seconds, converted to milliseconds.
fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| (secs * 1000.0) as u64)
}

/// Take `choices[0].message.content` as the completion.
///
/// A missing or null `content` becomes an empty string; the fallback chain
/// treats empty completions as failures.
fn into_completion(
    parsed: ChatCompletionResponse,
    requested_model: &str,
) -> Result<CompletionResponse, LlmError> {
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse("no choices".to_string()))?;

    let finish_reason = FinishReason::from_wire(choice.finish_reason.as_deref());

    let usage = parsed.usage.unwrap_or_default();

    Ok(CompletionResponse {
        id: parsed.id.unwrap_or_default(),
        content: choice.message.content.unwrap_or_default(),
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        finish_reason,
        usage: Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hinata_types::llm::{Message, MessageRole};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn provider(base_url: &str) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(
            OpenAiCompatConfig {
                provider_name: "groq".to_string(),
                base_url: base_url.to_string(),
                api_key: SecretString::from("gsk_test".to_string()),
                model: "llama3-8b-8192".to_string(),
            },
            reqwest::Client::new(),
        )
    }

    fn request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![
                Message::new(MessageRole::User, "hi"),
                Message::new(MessageRole::Assistant, "hello"),
                Message::new(MessageRole::User, "how are you"),
            ],
            system: Some("You are Hinata.".to_string()),
            max_tokens: 200,
            temperature: Some(0.7),
        }
    }

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nretry-after: 2\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{addr}/openai/v1"), handle)
    }

    #[test]
    fn test_url_from_configured_base() {
        let groq = provider("https://api.groq.com/openai/v1/");
        assert_eq!(groq.name(), "groq");
        assert_eq!(groq.url(), "https://api.groq.com/openai/v1/chat/completions");

        let gemini = provider("https://generativelanguage.googleapis.com/v1beta/openai");
        assert_eq!(
            gemini.url(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
    }

    #[test]
    fn test_build_body_puts_persona_first() {
        let body = provider("http://localhost").build_body(&request("gemma2-9b-it"));

        assert_eq!(body.model, "gemma2-9b-it");
        assert_eq!(body.max_tokens, 200);
        assert_eq!(body.temperature, Some(0.7));
        let roles: Vec<&str> = body.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(body.messages[0].content, "You are Hinata.");
        assert_eq!(body.messages[3].content, "how are you");
    }

    #[test]
    fn test_build_body_uses_default_model_when_unset() {
        let body = provider("http://localhost").build_body(&request(""));
        assert_eq!(body.model, "llama3-8b-8192");
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let p = provider("https://api.groq.com/openai/v1/");
        assert_eq!(p.url(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_map_status() {
        assert!(matches!(
            map_status(403, None, ""),
            LlmError::Unauthorized { status: 403 }
        ));
        assert!(matches!(
            map_status(429, Some(2000), ""),
            LlmError::RateLimited {
                retry_after_ms: Some(2000)
            }
        ));
        assert!(matches!(map_status(503, None, "busy"), LlmError::Overloaded(_)));
        assert!(matches!(
            map_status(404, None, "model_decommissioned"),
            LlmError::Rejected { status: 404, .. }
        ));

        let err = map_status(
            500,
            None,
            r#"{"error":{"message":"upstream exploded","type":"server_error","code":null}}"#,
        );
        assert_eq!(err.to_string(), "HTTP 500: upstream exploded");
    }

    #[test]
    fn test_into_completion_takes_first_choice() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{
                "id": "chatcmpl-1",
                "model": "llama3-8b-8192",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "E-eto... hi!"}, "finish_reason": "stop"},
                    {"index": 1, "message": {"role": "assistant", "content": "other"}, "finish_reason": "stop"}
                ],
                "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
            }"#,
        )
        .unwrap();

        let response = into_completion(parsed, "requested").unwrap();
        assert_eq!(response.id, "chatcmpl-1");
        assert_eq!(response.content, "E-eto... hi!");
        assert_eq!(response.model, "llama3-8b-8192");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.input_tokens, 42);
        assert_eq!(response.usage.output_tokens, 7);
    }

    #[test]
    fn test_into_completion_tolerates_sparse_body() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": null}, "finish_reason": "length"}]}"#,
        )
        .unwrap();

        let response = into_completion(parsed, "gemini-1.5-flash").unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.model, "gemini-1.5-flash");
        assert_eq!(response.finish_reason, FinishReason::Length);
    }

    #[test]
    fn test_into_completion_without_choices() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            into_completion(parsed, "m"),
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_round_trip_over_http() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"id":"c1","model":"llama3-8b-8192","choices":[{"message":{"role":"assistant","content":"H-hello!"},"finish_reason":"stop"}]}"#,
        )
        .await;

        let response = provider(&base_url)
            .complete(&request("llama3-8b-8192"))
            .await
            .unwrap();
        assert_eq!(response.content, "H-hello!");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /openai/v1/chat/completions"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer gsk_test"));
        assert!(raw.contains(r#""max_tokens":200"#));
    }

    #[tokio::test]
    async fn test_complete_maps_rate_limit() {
        let (base_url, server) = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"message":"Rate limit reached","type":"tokens"}}"#,
        )
        .await;

        let err = provider(&base_url)
            .complete(&request("llama3-8b-8192"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::RateLimited {
                retry_after_ms: Some(2000)
            }
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let (base_url, server) = serve_once("200 OK", "not json at all").await;

        let err = provider(&base_url)
            .complete(&request("llama3-8b-8192"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider(&format!("http://{addr}/v1"))
            .complete(&request("m"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
    }
}
