//! ConversationRepository trait definition.
//!
//! Append-only turn storage partitioned by conversation id. Follows the same
//! RPITIT pattern as `LlmProvider`.

use hinata_types::conversation::{ConversationId, ConversationTurn};
use hinata_types::error::RepositoryError;

/// Repository trait for conversation turn persistence.
///
/// Implementations live in hinata-infra (`SqliteConversationRepository`,
/// `InMemoryConversationRepository`). Turns are never updated or deleted.
pub trait ConversationRepository: Send + Sync {
    /// Append a turn to its conversation.
    fn append_turn(
        &self,
        turn: &ConversationTurn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The `limit` most recent turns of a conversation, oldest first.
    ///
    /// Turns written within the same clock tick keep insertion order.
    fn recent_turns(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationTurn>, RepositoryError>> + Send;

    /// Total number of turns stored for a conversation.
    fn count_turns(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
