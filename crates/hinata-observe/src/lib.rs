//! Observability for Hinata: tracing subscriber setup and the GenAI span
//! attribute names used when instrumenting provider calls.

pub mod genai_attrs;
pub mod tracing_setup;
