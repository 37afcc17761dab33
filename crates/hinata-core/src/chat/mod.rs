//! Conversation memory and the response engine.
//!
//! - `ConversationRepository`: storage port implemented in hinata-infra
//! - `ConversationStore`: failure-swallowing wrapper the engine talks to
//! - `prompt`: history windowing and request assembly
//! - `ResponseEngine`: one user message in, one reply out

pub mod engine;
pub mod prompt;
pub mod repository;
pub mod store;
