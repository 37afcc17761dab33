//! Expands configuration into the ordered list of provider attempts.

use hinata_types::config::HinataConfig;
use hinata_types::llm::ProviderAttempt;
use secrecy::{ExposeSecret, SecretString};

/// Build the attempt plan for one completion request.
///
/// Order: every primary model for the first primary key, then every primary
/// model for the second key, and so on; then one attempt against the
/// secondary provider. Blank keys are skipped and do not consume a slot.
pub fn build_attempt_plan(config: &HinataConfig) -> Vec<ProviderAttempt> {
    let keys: Vec<&str> = config
        .primary_provider_credentials
        .iter()
        .map(|k| k.expose_secret().trim())
        .filter(|k| !k.is_empty())
        .collect();

    let models: Vec<&str> = config
        .primary_provider_models
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();

    let mut plan = Vec::with_capacity(keys.len() * models.len() + 1);

    for (idx, key) in keys.iter().enumerate() {
        for model in &models {
            plan.push(ProviderAttempt {
                provider_name: config.primary_provider_name.clone(),
                base_url: config.primary_provider_base_url.clone(),
                credential: SecretString::from(key.to_string()),
                credential_slot: idx + 1,
                model: model.to_string(),
                timeout: config.primary_timeout(),
            });
        }
    }

    let secondary_key = config
        .secondary_provider_credential
        .as_ref()
        .map(|k| k.expose_secret().trim())
        .filter(|k| !k.is_empty());

    if let Some(key) = secondary_key {
        if !config.secondary_provider_model.trim().is_empty() {
            plan.push(ProviderAttempt {
                provider_name: config.secondary_provider_name.clone(),
                base_url: config.secondary_provider_base_url.clone(),
                credential: SecretString::from(key.to_string()),
                credential_slot: 1,
                model: config.secondary_provider_model.trim().to_string(),
                timeout: config.secondary_timeout(),
            });
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn secrets(keys: &[&str]) -> Vec<SecretString> {
        keys.iter().map(|k| SecretString::from(k.to_string())).collect()
    }

    #[test]
    fn test_no_credentials_gives_empty_plan() {
        let config = HinataConfig::default();
        assert!(build_attempt_plan(&config).is_empty());
    }

    #[test]
    fn test_credential_major_model_minor_order() {
        let config = HinataConfig {
            primary_provider_credentials: secrets(&["k1", "k2"]),
            primary_provider_models: vec!["m1".to_string(), "m2".to_string()],
            ..Default::default()
        };

        let labels: Vec<String> = build_attempt_plan(&config)
            .iter()
            .map(ProviderAttempt::label)
            .collect();
        assert_eq!(
            labels,
            vec!["groq/m1#1", "groq/m2#1", "groq/m1#2", "groq/m2#2"]
        );
    }

    #[test]
    fn test_blank_keys_are_skipped() {
        let config = HinataConfig {
            primary_provider_credentials: secrets(&["", " k1 ", "   ", "k2"]),
            ..Default::default()
        };

        let plan = build_attempt_plan(&config);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].credential.expose_secret(), "k1");
        assert_eq!(plan[0].credential_slot, 1);
        assert_eq!(plan[1].credential.expose_secret(), "k2");
        assert_eq!(plan[1].credential_slot, 2);
    }

    #[test]
    fn test_secondary_attempt_comes_last() {
        let config = HinataConfig {
            primary_provider_credentials: secrets(&["k1"]),
            secondary_provider_credential: Some(SecretString::from("g1".to_string())),
            ..Default::default()
        };

        let plan = build_attempt_plan(&config);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].provider_name, "groq");
        assert_eq!(plan[0].timeout, Duration::from_secs(5));
        assert_eq!(plan[1].provider_name, "gemini");
        assert_eq!(plan[1].model, "gemini-1.5-flash");
        assert_eq!(plan[1].credential_slot, 1);
        assert_eq!(plan[1].timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_secondary_only() {
        let config = HinataConfig {
            secondary_provider_credential: Some(SecretString::from("g1".to_string())),
            ..Default::default()
        };

        let plan = build_attempt_plan(&config);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].label(), "gemini/gemini-1.5-flash#1");
    }

    #[test]
    fn test_blank_secondary_key_is_ignored() {
        let config = HinataConfig {
            primary_provider_credentials: secrets(&["k1"]),
            secondary_provider_credential: Some(SecretString::from("  ".to_string())),
            ..Default::default()
        };

        assert_eq!(build_attempt_plan(&config).len(), 1);
    }
}
