//! Runtime selection of the conversation store backend.

use hinata_core::chat::repository::ConversationRepository;
use hinata_core::chat::store::ConversationStore;
use hinata_types::config::StoreBackend;
use hinata_types::conversation::{ConversationId, ConversationTurn};
use hinata_types::error::RepositoryError;

use crate::memory::InMemoryConversationRepository;
use crate::sqlite::conversation::SqliteConversationRepository;
use crate::sqlite::pool::DatabasePool;

/// The repository chosen by configuration.
///
/// An enum rather than a boxed trait object: `ConversationRepository` uses
/// RPITIT and the set of backends is closed.
#[derive(Clone)]
pub enum ConfiguredRepository {
    Sqlite(SqliteConversationRepository),
    Memory(InMemoryConversationRepository),
}

impl ConfiguredRepository {
    pub fn backend(&self) -> StoreBackend {
        match self {
            ConfiguredRepository::Sqlite(_) => StoreBackend::Sqlite,
            ConfiguredRepository::Memory(_) => StoreBackend::Memory,
        }
    }

    /// The SQLite pool, when this is the SQLite backend.
    pub fn pool(&self) -> Option<&DatabasePool> {
        match self {
            ConfiguredRepository::Sqlite(repo) => Some(repo.pool()),
            ConfiguredRepository::Memory(_) => None,
        }
    }
}

impl ConversationRepository for ConfiguredRepository {
    async fn append_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError> {
        match self {
            ConfiguredRepository::Sqlite(repo) => repo.append_turn(turn).await,
            ConfiguredRepository::Memory(repo) => repo.append_turn(turn).await,
        }
    }

    async fn recent_turns(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        match self {
            ConfiguredRepository::Sqlite(repo) => repo.recent_turns(conversation_id, limit).await,
            ConfiguredRepository::Memory(repo) => repo.recent_turns(conversation_id, limit).await,
        }
    }

    async fn count_turns(&self, conversation_id: &ConversationId) -> Result<u64, RepositoryError> {
        match self {
            ConfiguredRepository::Sqlite(repo) => repo.count_turns(conversation_id).await,
            ConfiguredRepository::Memory(repo) => repo.count_turns(conversation_id).await,
        }
    }
}

/// Open the configured store.
///
/// `StoreBackend::None` yields a disabled store. A SQLite backend that cannot
/// be opened degrades to a disabled store with a warning; the bot keeps
/// answering without memory.
pub async fn open_store(
    backend: StoreBackend,
    database_url: &str,
) -> ConversationStore<ConfiguredRepository> {
    match backend {
        StoreBackend::None => {
            tracing::info!("Conversation store disabled");
            ConversationStore::disabled()
        }
        StoreBackend::Memory => {
            tracing::debug!("Using in-memory conversation store");
            ConversationStore::new(ConfiguredRepository::Memory(
                InMemoryConversationRepository::new(),
            ))
        }
        StoreBackend::Sqlite => match DatabasePool::new(database_url).await {
            Ok(pool) => {
                tracing::debug!(url = %database_url, "Opened SQLite conversation store");
                ConversationStore::new(ConfiguredRepository::Sqlite(
                    SqliteConversationRepository::new(pool),
                ))
            }
            Err(e) => {
                tracing::warn!(
                    url = %database_url,
                    error = %e,
                    "Failed to open SQLite store, continuing without conversation memory"
                );
                ConversationStore::disabled()
            }
        },
    }
}
