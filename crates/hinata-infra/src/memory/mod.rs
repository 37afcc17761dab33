//! In-memory conversation repository.
//!
//! Keeps every conversation's turns in a `DashMap` shard keyed by conversation
//! id. Nothing survives the process; used for ephemeral runs and tests.

use std::sync::Arc;

use dashmap::DashMap;
use hinata_core::chat::repository::ConversationRepository;
use hinata_types::conversation::{ConversationId, ConversationTurn};
use hinata_types::error::RepositoryError;

/// Concurrent map of conversation id to its turns in insertion order.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryConversationRepository {
    turns: Arc<DashMap<ConversationId, Vec<ConversationTurn>>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationRepository for InMemoryConversationRepository {
    async fn append_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError> {
        self.turns
            .entry(turn.conversation_id.clone())
            .or_default()
            .push(turn.clone());
        Ok(())
    }

    async fn recent_turns(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let Some(turns) = self.turns.get(conversation_id) else {
            return Ok(Vec::new());
        };
        let skip = turns.len().saturating_sub(limit);
        Ok(turns[skip..].to_vec())
    }

    async fn count_turns(&self, conversation_id: &ConversationId) -> Result<u64, RepositoryError> {
        Ok(self
            .turns
            .get(conversation_id)
            .map(|turns| turns.len() as u64)
            .unwrap_or(0))
    }
}
