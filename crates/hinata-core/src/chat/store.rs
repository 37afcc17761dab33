//! Conversation store: the engine's view of conversation memory.
//!
//! Wraps an optional [`ConversationRepository`]. Storage failures never reach
//! the caller; they are logged at `warn` and turned into "write dropped" or
//! "no history".

use hinata_types::conversation::{ConversationId, ConversationTurn, TurnRole};

use super::repository::ConversationRepository;

pub struct ConversationStore<R: ConversationRepository> {
    repo: Option<R>,
}

impl<R: ConversationRepository> ConversationStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo: Some(repo) }
    }

    /// A store with no backend: appends are no-ops, history is always empty.
    pub fn disabled() -> Self {
        Self { repo: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.repo.is_some()
    }

    /// Access the underlying repository, if any.
    pub fn repository(&self) -> Option<&R> {
        self.repo.as_ref()
    }

    /// Record a turn stamped with the current time.
    ///
    /// Returns the written turn, or `None` when there is no backend or the
    /// write failed.
    pub async fn append(
        &self,
        conversation_id: &ConversationId,
        role: TurnRole,
        text: &str,
    ) -> Option<ConversationTurn> {
        let repo = self.repo.as_ref()?;
        let turn = ConversationTurn::new(conversation_id.clone(), role, text);

        match repo.append_turn(&turn).await {
            Ok(()) => Some(turn),
            Err(e) => {
                tracing::warn!(
                    conversation = %conversation_id,
                    role = %role,
                    error = %e,
                    "Failed to record conversation turn"
                );
                None
            }
        }
    }

    /// Up to `limit` most recent turns, oldest first.
    pub async fn recent(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Vec<ConversationTurn> {
        let Some(repo) = self.repo.as_ref() else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        match repo.recent_turns(conversation_id, limit).await {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(
                    conversation = %conversation_id,
                    error = %e,
                    "Failed to read conversation history, continuing without it"
                );
                Vec::new()
            }
        }
    }

    /// Total turns stored for a conversation.
    ///
    /// `None` when there is no backend or the count could not be read.
    pub async fn count(&self, conversation_id: &ConversationId) -> Option<u64> {
        let repo = self.repo.as_ref()?;

        match repo.count_turns(conversation_id).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(
                    conversation = %conversation_id,
                    error = %e,
                    "Failed to count conversation turns"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hinata_types::error::RepositoryError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct VecRepository {
        turns: Mutex<Vec<ConversationTurn>>,
        reads: AtomicUsize,
    }

    impl ConversationRepository for VecRepository {
        async fn append_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError> {
            self.turns.lock().unwrap().push(turn.clone());
            Ok(())
        }

        async fn recent_turns(
            &self,
            conversation_id: &ConversationId,
            limit: usize,
        ) -> Result<Vec<ConversationTurn>, RepositoryError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let turns = self.turns.lock().unwrap();
            let matching: Vec<_> = turns
                .iter()
                .filter(|t| &t.conversation_id == conversation_id)
                .cloned()
                .collect();
            let skip = matching.len().saturating_sub(limit);
            Ok(matching.into_iter().skip(skip).collect())
        }

        async fn count_turns(
            &self,
            conversation_id: &ConversationId,
        ) -> Result<u64, RepositoryError> {
            let turns = self.turns.lock().unwrap();
            Ok(turns.iter().filter(|t| &t.conversation_id == conversation_id).count() as u64)
        }
    }

    struct BrokenRepository;

    impl ConversationRepository for BrokenRepository {
        async fn append_turn(&self, _turn: &ConversationTurn) -> Result<(), RepositoryError> {
            Err(RepositoryError::Connection)
        }

        async fn recent_turns(
            &self,
            _conversation_id: &ConversationId,
            _limit: usize,
        ) -> Result<Vec<ConversationTurn>, RepositoryError> {
            Err(RepositoryError::Query("disk I/O error".to_string()))
        }

        async fn count_turns(
            &self,
            _conversation_id: &ConversationId,
        ) -> Result<u64, RepositoryError> {
            Err(RepositoryError::Connection)
        }
    }

    #[tokio::test]
    async fn test_append_returns_written_turn() {
        let store = ConversationStore::new(VecRepository::default());
        let id = ConversationId::from("chat-1");

        let turn = store.append(&id, TurnRole::User, "hi").await.unwrap();
        assert_eq!(turn.text, "hi");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.conversation_id, id);

        assert_eq!(store.count(&id).await, Some(1));
        assert_eq!(store.count(&ConversationId::from("chat-2")).await, Some(0));
    }

    #[tokio::test]
    async fn test_recent_is_bounded_and_chronological() {
        let store = ConversationStore::new(VecRepository::default());
        let id = ConversationId::from("chat-1");
        for i in 0..5 {
            store.append(&id, TurnRole::User, &format!("msg {i}")).await;
        }

        let texts: Vec<String> = store
            .recent(&id, 3)
            .await
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["msg 2", "msg 3", "msg 4"]);
    }

    #[tokio::test]
    async fn test_recent_with_zero_limit_skips_backend() {
        let store = ConversationStore::new(VecRepository::default());
        let id = ConversationId::from("chat-1");
        store.append(&id, TurnRole::User, "hi").await;

        assert!(store.recent(&id, 0).await.is_empty());
        assert_eq!(store.repository().unwrap().reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recent_unknown_conversation_is_empty() {
        let store = ConversationStore::new(VecRepository::default());
        assert!(store.recent(&ConversationId::from("nobody"), 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_store_is_a_no_op() {
        let store = ConversationStore::<VecRepository>::disabled();
        let id = ConversationId::from("chat-1");

        assert!(!store.is_enabled());
        assert!(store.append(&id, TurnRole::User, "hi").await.is_none());
        assert!(store.recent(&id, 10).await.is_empty());
        assert_eq!(store.count(&id).await, None);
    }

    #[tokio::test]
    async fn test_backend_errors_are_swallowed() {
        let store = ConversationStore::new(BrokenRepository);
        let id = ConversationId::from("chat-1");

        assert!(store.append(&id, TurnRole::User, "hi").await.is_none());
        assert!(store.recent(&id, 10).await.is_empty());
        assert_eq!(store.count(&id).await, None);
    }
}
