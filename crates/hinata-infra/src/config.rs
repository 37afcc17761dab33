//! Configuration loader for Hinata.
//!
//! Reads `hinata.toml` from the data directory (`~/.hinata/` by default) into
//! [`HinataConfig`], then applies environment overrides. Environment wins over
//! the file; a missing or malformed file falls back to defaults, and values
//! no request could succeed with (zero timeouts, zero `max_tokens`, an
//! out-of-range temperature) are reset to theirs.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;

use hinata_types::config::{HinataConfig, StoreBackend};
use hinata_types::error::ConfigError;

use crate::sqlite::pool::default_database_url;

/// File name of the optional config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "hinata.toml";

/// Env var naming the data directory.
pub const DATA_DIR_ENV: &str = "HINATA_DATA_DIR";

/// Resolve the data directory.
///
/// Priority: `HINATA_DATA_DIR`, then `~/.hinata`, then `./.hinata`.
pub fn resolve_data_dir() -> PathBuf {
    resolve_data_dir_with(|key| std::env::var(key).ok())
}

fn resolve_data_dir_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }

    // Use home directory fallback: ~/.hinata
    if let Some(home) = dirs::home_dir() {
        return home.join(".hinata");
    }

    // Last resort: current directory
    PathBuf::from(".hinata")
}

/// Read and parse `path`. `Ok(None)` when the file does not exist.
pub async fn read_config_file(path: &Path) -> Result<Option<HinataConfig>, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<HinataConfig>(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })
}

/// Load `{data_dir}/hinata.toml`, falling back to defaults.
pub async fn load_config_file(data_dir: &Path) -> HinataConfig {
    let config_path = data_dir.join(CONFIG_FILE_NAME);

    match read_config_file(&config_path).await {
        Ok(Some(mut config)) => {
            sanitize(&mut config);
            config
        }
        Ok(None) => {
            tracing::debug!(
                "No {CONFIG_FILE_NAME} found at {}, using defaults",
                config_path.display()
            );
            HinataConfig::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            HinataConfig::default()
        }
    }
}

/// Load the full configuration: file, then process environment.
pub async fn load_config(data_dir: &Path) -> HinataConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// The SQLite URL to open: the configured override or `{data_dir}/hinata.db`.
pub fn database_url(config: &HinataConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides read through `lookup`.
///
/// Empty values are treated as unset. Values that fail to parse are logged
/// and ignored, keeping whatever the file (or default) said.
pub fn apply_env_overrides(config: &mut HinataConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(keys) = get("GROQ_API_KEY") {
        config.primary_provider_credentials = keys
            .split(',')
            .map(|k| SecretString::from(k.to_string()))
            .collect();
    }
    if let Some(models) = get("HINATA_PRIMARY_MODELS") {
        let models = split_list(&models);
        if models.is_empty() {
            tracing::warn!("HINATA_PRIMARY_MODELS lists no models, ignoring");
        } else {
            config.primary_provider_models = models;
        }
    }
    if let Some(name) = get("HINATA_PRIMARY_PROVIDER") {
        config.primary_provider_name = name.trim().to_string();
    }
    if let Some(url) = get("HINATA_PRIMARY_BASE_URL") {
        config.primary_provider_base_url = url.trim().to_string();
    }

    if let Some(key) = get("HINATA_SECONDARY_API_KEY").or_else(|| get("GEMINI_API_KEY")) {
        config.secondary_provider_credential = Some(SecretString::from(key));
    }
    if let Some(model) = get("HINATA_SECONDARY_MODEL") {
        config.secondary_provider_model = model.trim().to_string();
    }
    if let Some(name) = get("HINATA_SECONDARY_PROVIDER") {
        config.secondary_provider_name = name.trim().to_string();
    }
    if let Some(url) = get("HINATA_SECONDARY_BASE_URL") {
        config.secondary_provider_base_url = url.trim().to_string();
    }

    if let Some(window) = parse_env::<usize>(&get, "HINATA_HISTORY_WINDOW") {
        config.history_window = window;
    }
    if let Some(prompt) = get("HINATA_PERSONA_PROMPT") {
        config.persona_prompt = prompt;
    }
    if let Some(reply) = get("HINATA_FALLBACK_REPLY") {
        config.fallback_reply = reply;
    }

    if let Some(ms) = parse_positive::<u64>(&get, "HINATA_PRIMARY_TIMEOUT_MS") {
        config.request_timeout_primary_ms = ms;
    }
    if let Some(ms) = parse_positive::<u64>(&get, "HINATA_SECONDARY_TIMEOUT_MS") {
        config.request_timeout_secondary_ms = ms;
    }
    if let Some(temperature) = parse_env::<f64>(&get, "HINATA_TEMPERATURE") {
        if temperature.is_finite() && (0.0..=2.0).contains(&temperature) {
            config.temperature = temperature;
        } else {
            tracing::warn!(value = temperature, "HINATA_TEMPERATURE out of range 0..=2, ignoring");
        }
    }
    if let Some(max_tokens) = parse_positive::<u32>(&get, "HINATA_MAX_TOKENS") {
        config.max_tokens = max_tokens;
    }

    if let Some(store) = parse_env::<StoreBackend>(&get, "HINATA_STORE") {
        config.store = store;
    }
    if let Some(url) = get("HINATA_DATABASE_URL") {
        config.database_url = Some(url.trim().to_string());
    }

    sanitize(config);
}

/// Reset unusable values to their defaults, logging each one.
fn sanitize(config: &mut HinataConfig) {
    for correction in config.sanitize() {
        tracing::warn!(
            field = correction.field,
            value = %correction.rejected,
            "Unusable configuration value, using default"
        );
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_env<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = get(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                key,
                value = %raw,
                error = %err,
                "Ignoring unparseable environment override"
            );
            None
        }
    }
}

fn parse_positive<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr + Default + PartialEq,
    T::Err: Display,
{
    let value = parse_env::<T>(get, key)?;
    if value == T::default() {
        tracing::warn!(key, "Environment override must be greater than zero, ignoring");
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn exposed(secrets: &[SecretString]) -> Vec<String> {
        secrets.iter().map(|s| s.expose_secret().to_string()).collect()
    }

    #[tokio::test]
    async fn load_config_file_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.history_window, 10);
        assert!(config.primary_provider_credentials.is_empty());
    }

    #[tokio::test]
    async fn load_config_file_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
primary_provider_credentials = ["k1"]
history_window = 4
store = "none"
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(exposed(&config.primary_provider_credentials), vec!["k1"]);
        assert_eq!(config.history_window, 4);
        assert_eq!(config.store, StoreBackend::None);
    }

    #[tokio::test]
    async fn load_config_file_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.history_window, 10);
    }

    #[tokio::test]
    async fn load_config_file_resets_unusable_values() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
request_timeout_primary_ms = 0
max_tokens = 0
temperature = 9.0
history_window = 3
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.request_timeout_primary_ms, 5000);
        assert_eq!(config.max_tokens, 200);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.history_window, 3);
    }

    #[test]
    fn env_overrides_reset_unusable_file_values() {
        let mut config: HinataConfig = toml::from_str(
            r#"
request_timeout_secondary_ms = 0
temperature = -1.0
"#,
        )
        .unwrap();
        apply_env_overrides(&mut config, env(&[]));

        assert_eq!(config.request_timeout_secondary_ms, 20000);
        assert_eq!(config.temperature, 0.7);
    }

    #[tokio::test]
    async fn read_config_file_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "history_window = \"ten\"").await.unwrap();

        let err = read_config_file(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(read_config_file(&tmp.path().join("absent.toml")).await.unwrap().is_none());
    }

    #[test]
    fn env_overrides_credentials_and_models() {
        let mut config = HinataConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("GROQ_API_KEY", "k1, ,k2,"),
                ("HINATA_PRIMARY_MODELS", "llama-3.1-8b-instant, gemma2-9b-it"),
                ("GEMINI_API_KEY", "g1"),
            ]),
        );

        // Blank entries survive here; the attempt plan skips them.
        assert_eq!(exposed(&config.primary_provider_credentials), vec!["k1", " ", "k2", ""]);
        assert_eq!(
            config.primary_provider_models,
            vec!["llama-3.1-8b-instant", "gemma2-9b-it"]
        );
        assert_eq!(
            config.secondary_provider_credential.as_ref().map(|s| s.expose_secret().to_string()),
            Some("g1".to_string())
        );
    }

    #[test]
    fn env_secondary_key_prefers_hinata_name() {
        let mut config = HinataConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("HINATA_SECONDARY_API_KEY", "primary-name"), ("GEMINI_API_KEY", "alias")]),
        );
        assert_eq!(
            config.secondary_provider_credential.as_ref().map(|s| s.expose_secret().to_string()),
            Some("primary-name".to_string())
        );
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut config: HinataConfig = toml::from_str(
            r#"
history_window = 4
request_timeout_primary_ms = 3000
store = "memory"
"#,
        )
        .unwrap();

        apply_env_overrides(
            &mut config,
            env(&[
                ("HINATA_HISTORY_WINDOW", "6"),
                ("HINATA_PRIMARY_TIMEOUT_MS", "2500"),
                ("HINATA_STORE", "sqlite"),
                ("HINATA_TEMPERATURE", "0.3"),
                ("HINATA_MAX_TOKENS", "120"),
                ("HINATA_FALLBACK_REPLY", "sorry!"),
            ]),
        );

        assert_eq!(config.history_window, 6);
        assert_eq!(config.request_timeout_primary_ms, 2500);
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.max_tokens, 120);
        assert_eq!(config.fallback_reply, "sorry!");
    }

    #[test]
    fn env_bad_numbers_are_ignored() {
        let mut config = HinataConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("HINATA_HISTORY_WINDOW", "lots"),
                ("HINATA_PRIMARY_TIMEOUT_MS", "0"),
                ("HINATA_TEMPERATURE", "9.5"),
                ("HINATA_MAX_TOKENS", "-1"),
                ("HINATA_STORE", "redis"),
            ]),
        );

        assert_eq!(config.history_window, 10);
        assert_eq!(config.request_timeout_primary_ms, 5_000);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 200);
        assert_eq!(config.store, StoreBackend::Sqlite);
    }

    #[test]
    fn env_empty_values_count_as_unset() {
        let mut config = HinataConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("GROQ_API_KEY", ""), ("HINATA_PERSONA_PROMPT", "   ")]),
        );
        assert!(config.primary_provider_credentials.is_empty());
        assert!(config.persona_prompt.starts_with("You are Hinata"));
    }

    #[test]
    fn resolve_data_dir_prefers_env() {
        let dir = resolve_data_dir_with(env(&[(DATA_DIR_ENV, "/srv/hinata")]));
        assert_eq!(dir, PathBuf::from("/srv/hinata"));

        let fallback = resolve_data_dir_with(env(&[]));
        assert!(fallback.ends_with(".hinata"));
    }

    #[test]
    fn database_url_defaults_to_data_dir() {
        let mut config = HinataConfig::default();
        assert_eq!(
            database_url(&config, Path::new("/data")),
            "sqlite:///data/hinata.db?mode=rwc"
        );

        config.database_url = Some("sqlite::memory:".to_string());
        assert_eq!(database_url(&config, Path::new("/data")), "sqlite::memory:");
    }
}
