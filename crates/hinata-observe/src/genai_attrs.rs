//! OpenTelemetry GenAI Semantic Convention attribute names.
//!
//! Span fields declared in `tracing::info_span!` must be spelled literally,
//! so the provider-attempt span in `hinata-core` writes the request
//! attributes (`gen_ai.system`, `gen_ai.request.model`, ...) out and leaves
//! the response fields empty. Providers fill those in afterwards via
//! `Span::record` with the constants below.
//!
//! Span naming convention: `"gen_ai.complete"` per provider attempt.

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason reported by the provider (e.g., "stop", "length").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";
