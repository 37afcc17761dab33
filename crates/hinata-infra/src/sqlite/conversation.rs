//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `hinata-core` using sqlx with split
//! read/write pools. Turns are ordered by the autoincrement `seq` column, never
//! by timestamp, so writes within the same clock tick keep insertion order.

use chrono::{DateTime, Utc};
use hinata_core::chat::repository::ConversationRepository;
use hinata_types::conversation::{ConversationId, ConversationTurn, TurnRole};
use hinata_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct TurnRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_turn(self) -> Result<ConversationTurn, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid turn id: {e}")))?;
        let role: TurnRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let timestamp = parse_datetime(&self.created_at)?;

        Ok(ConversationTurn {
            id,
            conversation_id: ConversationId::new(self.conversation_id),
            role,
            text: self.content,
            timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Pool and I/O failures are connection errors; everything else is a query error.
fn repository_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn append_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversation_turns (id, conversation_id, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(turn.id.to_string())
        .bind(turn.conversation_id.as_str())
        .bind(turn.role.to_string())
        .bind(&turn.text)
        .bind(format_datetime(&turn.timestamp))
        .execute(&self.pool.writer)
        .await
        .map_err(repository_error)?;

        Ok(())
    }

    async fn recent_turns(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM conversation_turns
                   WHERE conversation_id = ?
                   ORDER BY seq DESC
                   LIMIT ?
               ) ORDER BY seq ASC"#,
        )
        .bind(conversation_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(repository_error)?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in &rows {
            let turn_row = TurnRow::from_row(row).map_err(repository_error)?;
            turns.push(turn_row.into_turn()?);
        }

        Ok(turns)
    }

    async fn count_turns(&self, conversation_id: &ConversationId) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as cnt FROM conversation_turns WHERE conversation_id = ?",
        )
        .bind(conversation_id.as_str())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(repository_error)?;

        let count: i64 = row.try_get("cnt").map_err(repository_error)?;

        Ok(count as u64)
    }
}
