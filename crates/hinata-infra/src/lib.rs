//! Infrastructure layer for Hinata.
//!
//! Contains implementations of the ports defined in `hinata-core`: SQLite and
//! in-memory conversation repositories, the OpenAI-compatible HTTP provider,
//! and the configuration loader.

pub mod config;
pub mod llm;
pub mod memory;
pub mod sqlite;
pub mod store;
