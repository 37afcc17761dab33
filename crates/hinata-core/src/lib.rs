//! Business logic and repository trait definitions for Hinata.
//!
//! This crate defines the "ports" (conversation repository, LLM provider)
//! that the infrastructure layer implements, plus the response engine that
//! ties them together. It depends only on `hinata-types` -- never on
//! `hinata-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
