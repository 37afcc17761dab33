//! LLM provider abstractions for Hinata.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: shared, type-erased provider handle
//! - `FallbackChain`: ordered, timeout-bounded provider attempts
//! - `plan`: expands configuration into the ordered attempt list

pub mod box_provider;
pub mod fallback;
pub mod plan;
pub mod provider;
