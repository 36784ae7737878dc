use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::core::db::{format_timestamp, parse_timestamp};
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, Role};

/// One persisted message of a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub id: i64,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// Append-only chat transcripts keyed by caller-chosen session ids.
///
/// Turns are never updated. Row ids are assigned in insertion order and are
/// the ordering key for every read.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init chat_history table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_history_session ON chat_history(session_id, id)",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn add_turn(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ChatTurn, ApiError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO chat_history (session_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(ChatTurn {
            id: result.last_insert_rowid(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            created_at: now,
        })
    }

    /// The `limit` newest turns of a session, oldest first.
    pub async fn recent_turns(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatTurn>, ApiError> {
        let rows = sqlx::query(
            "SELECT * FROM (SELECT * FROM chat_history WHERE session_id = ? ORDER BY id DESC LIMIT ?) ORDER BY id ASC",
        )
        .bind(session_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        rows.iter().map(row_to_turn).collect()
    }

    /// Full transcript, oldest first.
    pub async fn turns(&self, session_id: &str) -> Result<Vec<ChatTurn>, ApiError> {
        let rows = sqlx::query("SELECT * FROM chat_history WHERE session_id = ? ORDER BY id ASC")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        rows.iter().map(row_to_turn).collect()
    }

    /// Deletes every turn of the session and returns how many were removed.
    pub async fn clear(&self, session_id: &str) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM chat_history WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self, session_id: &str) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM chat_history WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)
    }
}

fn row_to_turn(row: &SqliteRow) -> Result<ChatTurn, ApiError> {
    let role: String = row.try_get("role").map_err(ApiError::internal)?;
    let created_at: String = row.try_get("created_at").map_err(ApiError::internal)?;

    Ok(ChatTurn {
        id: row.try_get("id").map_err(ApiError::internal)?,
        session_id: row.try_get("session_id").map_err(ApiError::internal)?,
        role: role.parse::<Role>().map_err(ApiError::Internal)?,
        content: row.try_get("content").map_err(ApiError::internal)?,
        created_at: parse_timestamp(&created_at)?,
    })
}
