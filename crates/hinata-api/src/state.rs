//! Application state wiring configuration, storage and providers together.

use std::sync::Arc;

use anyhow::Context;

use hinata_core::chat::engine::{EngineSettings, ResponseEngine};
use hinata_infra::config::{database_url, load_config, resolve_data_dir};
use hinata_infra::llm::build_chain;
use hinata_infra::store::{ConfiguredRepository, open_store};
use hinata_types::config::{HinataConfig, StoreBackend};

/// Engine pinned to the infra store implementation.
pub type ConcreteEngine = ResponseEngine<ConfiguredRepository>;

/// Shared state handed to every command handler.
pub struct AppState {
    pub config: HinataConfig,
    /// Resolved SQLite URL, whether or not the SQLite store is in use.
    pub database_url: String,
    pub engine: Arc<ConcreteEngine>,
}

impl AppState {
    /// Load config, open the store and build the provider chain.
    ///
    /// A store that cannot be opened does not fail startup; see
    /// [`open_store`].
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let db_url = database_url(&config, &data_dir);
        let store = open_store(config.store, &db_url).await;
        let chain = build_chain(&config).context("failed to build provider chain")?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            store = %config.store,
            store_enabled = store.is_enabled(),
            attempts = chain.len(),
            "Application state initialized"
        );

        let engine = ResponseEngine::new(store, chain, EngineSettings::from_config(&config));

        Ok(Self {
            config,
            database_url: db_url,
            engine: Arc::new(engine),
        })
    }

    /// Where conversation turns are kept, for display.
    pub fn store_location(&self) -> String {
        store_location(self.engine.store().repository(), &self.database_url)
    }

    /// Close the database pool, if one is open.
    pub async fn shutdown(&self) {
        if let Some(pool) = self.engine.store().repository().and_then(|r| r.pool()) {
            pool.close().await;
        }
    }
}

/// Describe the store actually opened, which may differ from the configured
/// backend when SQLite failed to open.
fn store_location(repo: Option<&ConfiguredRepository>, database_url: &str) -> String {
    match repo.map(ConfiguredRepository::backend) {
        Some(StoreBackend::Sqlite) => format!("sqlite {database_url}"),
        Some(backend) => backend.to_string(),
        None => "off".to_string(),
    }
}
