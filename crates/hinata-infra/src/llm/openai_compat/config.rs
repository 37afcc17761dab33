//! Configuration for OpenAI-compatible providers.

use secrecy::{ExposeSecret, SecretString};

use hinata_types::llm::ProviderAttempt;

/// Configuration for one [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "groq", "gemini").
    pub provider_name: String,
    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: SecretString,
    /// Model used when the request does not name one.
    pub model: String,
}

impl OpenAiCompatConfig {
    /// Configuration for the provider behind one attempt.
    pub fn from_attempt(attempt: &ProviderAttempt) -> Self {
        Self {
            provider_name: attempt.provider_name.clone(),
            base_url: attempt.base_url.clone(),
            api_key: SecretString::from(attempt.credential.expose_secret().to_string()),
            model: attempt.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_from_attempt() {
        let attempt = ProviderAttempt {
            provider_name: "groq".to_string(),
            base_url: "http://localhost:9999/v1".to_string(),
            credential: SecretString::from("k2".to_string()),
            credential_slot: 2,
            model: "gemma2-9b-it".to_string(),
            timeout: Duration::from_secs(5),
        };
        let config = OpenAiCompatConfig::from_attempt(&attempt);
        assert_eq!(config.base_url, "http://localhost:9999/v1");
        assert_eq!(config.api_key.expose_secret(), "k2");
        assert_eq!(config.model, "gemma2-9b-it");
    }
}
