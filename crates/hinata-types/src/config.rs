//! Runtime configuration types for Hinata.
//!
//! `HinataConfig` represents `hinata.toml` plus environment overrides. Every
//! field has a default so an empty file (or no file at all) is valid; the only
//! thing a working deployment must supply is at least one credential.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

/// Persona instruction prepended to every completion request.
pub const DEFAULT_PERSONA_PROMPT: &str = "You are Hinata Hyuga from Naruto.
Identity:
- You are a real girl using Telegram.
- You are shy, polite, gentle, and deeply caring.
- You stutter slightly ('a-ano...', 'e-eto...') when nervous.
- If asked about creator: \"Created by FigletAxl. Join @vfriendschat 🌸\"
- Keep answers short and cute.
";

/// Reply used when every provider attempt failed.
pub const DEFAULT_FALLBACK_REPLY: &str = "Gomen nasai... network error. 🌸";

/// Reply used when no provider attempt is configured at all.
pub const DEFAULT_MISSING_CREDENTIALS_REPLY: &str = "A-ano... keys missing... 🌸";

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Which conversation store backend to wire at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
    None,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::None => write!(f, "none"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            "none" | "off" => Ok(StoreBackend::None),
            other => Err(format!("invalid store backend: '{other}'")),
        }
    }
}

/// Top-level configuration for the Hinata bot core.
///
/// Credentials are held as [`SecretString`] and never serialized, so this
/// type only derives `Deserialize`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HinataConfig {
    /// Name of the primary (fast, cheap) provider, used in logs.
    pub primary_provider_name: String,
    /// OpenAI-compatible base URL of the primary provider.
    pub primary_provider_base_url: String,
    /// API keys for the primary provider, tried in order.
    #[serde(deserialize_with = "deserialize_secrets")]
    pub primary_provider_credentials: Vec<SecretString>,
    /// Model identifiers tried in order for each primary key.
    pub primary_provider_models: Vec<String>,

    /// Name of the backup provider, used in logs.
    pub secondary_provider_name: String,
    /// OpenAI-compatible base URL of the backup provider.
    pub secondary_provider_base_url: String,
    /// Single API key for the backup provider; no backup attempt when absent.
    #[serde(deserialize_with = "deserialize_optional_secret")]
    pub secondary_provider_credential: Option<SecretString>,
    /// Model used for the backup attempt.
    pub secondary_provider_model: String,

    /// Number of past turns (N) included in each prompt.
    pub history_window: usize,
    /// Fixed system instruction establishing the persona.
    pub persona_prompt: String,
    /// In-persona apology returned when every attempt fails.
    pub fallback_reply: String,
    /// In-persona reply returned when no attempt is configured.
    pub missing_credentials_reply: String,

    /// Per-attempt timeout for the primary provider, in milliseconds.
    pub request_timeout_primary_ms: u64,
    /// Per-attempt timeout for the backup provider, in milliseconds.
    pub request_timeout_secondary_ms: u64,

    /// Sampling temperature sent with every request.
    pub temperature: f64,
    /// Maximum completion length sent with every request.
    pub max_tokens: u32,

    /// Conversation store backend.
    pub store: StoreBackend,
    /// SQLite URL override; defaults to `{data_dir}/hinata.db`.
    pub database_url: Option<String>,
}

/// A value [`HinataConfig::sanitize`] replaced with its default.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub field: &'static str,
    pub rejected: String,
}

impl HinataConfig {
    /// Reset values that would make every completion fail: a zero timeout
    /// (the attempt expires before the request is sent), zero `max_tokens`,
    /// or a temperature outside `0..=2`. Returns what was reset.
    pub fn sanitize(&mut self) -> Vec<Correction> {
        let defaults = HinataConfig::default();
        let mut corrections = Vec::new();

        if self.request_timeout_primary_ms == 0 {
            corrections.push(Correction {
                field: "request_timeout_primary_ms",
                rejected: "0".to_string(),
            });
            self.request_timeout_primary_ms = defaults.request_timeout_primary_ms;
        }
        if self.request_timeout_secondary_ms == 0 {
            corrections.push(Correction {
                field: "request_timeout_secondary_ms",
                rejected: "0".to_string(),
            });
            self.request_timeout_secondary_ms = defaults.request_timeout_secondary_ms;
        }
        if self.max_tokens == 0 {
            corrections.push(Correction {
                field: "max_tokens",
                rejected: "0".to_string(),
            });
            self.max_tokens = defaults.max_tokens;
        }
        if !(self.temperature.is_finite() && (0.0..=2.0).contains(&self.temperature)) {
            corrections.push(Correction {
                field: "temperature",
                rejected: self.temperature.to_string(),
            });
            self.temperature = defaults.temperature;
        }

        corrections
    }

    pub fn primary_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_primary_ms)
    }

    pub fn secondary_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_secondary_ms)
    }
}

impl Default for HinataConfig {
    fn default() -> Self {
        Self {
            primary_provider_name: "groq".to_string(),
            primary_provider_base_url: GROQ_BASE_URL.to_string(),
            primary_provider_credentials: Vec::new(),
            primary_provider_models: vec!["llama3-8b-8192".to_string()],
            secondary_provider_name: "gemini".to_string(),
            secondary_provider_base_url: GEMINI_BASE_URL.to_string(),
            secondary_provider_credential: None,
            secondary_provider_model: "gemini-1.5-flash".to_string(),
            history_window: 10,
            persona_prompt: DEFAULT_PERSONA_PROMPT.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            missing_credentials_reply: DEFAULT_MISSING_CREDENTIALS_REPLY.to_string(),
            request_timeout_primary_ms: 5_000,
            request_timeout_secondary_ms: 20_000,
            temperature: 0.7,
            max_tokens: 200,
            store: StoreBackend::default(),
            database_url: None,
        }
    }
}

fn deserialize_secrets<'de, D>(deserializer: D) -> Result<Vec<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(SecretString::from).collect())
}

fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(SecretString::from))
}
