//! Shared domain types for Hinata.
//!
//! Conversation turns, LLM request/response shapes, runtime configuration,
//! and the error types shared by the core and infrastructure crates.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
