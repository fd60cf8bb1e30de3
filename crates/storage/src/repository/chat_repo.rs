use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::ConversationStore;
use tutor_core::{
    ConversationTurn, Result, SenderRole, SessionSummary, StoredMessage, TutorError,
};

/// 对话消息表的原始行
///
/// 对应数据库表: `chat_messages`
#[derive(Debug, FromRow)]
struct ChatMessageRow {
    id: i64,
    text: String,
    /// "user" / "ai"
    sender: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<ChatMessageRow> for StoredMessage {
    type Error = TutorError;

    fn try_from(row: ChatMessageRow) -> Result<Self> {
        let sender = SenderRole::try_from(row.sender.clone()).map_err(|_| {
            TutorError::PersistenceError(format!(
                "Unknown sender `{}` in chat_messages row {}",
                row.sender, row.id
            ))
        })?;
        Ok(StoredMessage {
            id: row.id,
            text: row.text,
            sender,
            timestamp: row.timestamp,
        })
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    session_id: String,
    created_at: DateTime<Utc>,
    message_count: i64,
}

/// MySQL 版对话存储
///
/// 启动时数据库可能不可达，表结构在第一次 `ping()` 成功时补建，只建一次。
#[derive(Clone)]
pub struct ChatRepository {
    pool: MySqlPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl ChatRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                crate::db::create_schema(&self.pool).await?;
                info!("📦 Schema `chat_messages` is ready.");
                Ok::<(), TutorError>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for ChatRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        self.ensure_schema().await
    }

    async fn append(&self, turn: &ConversationTurn) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_messages (user_id, session_id, `text`, sender, `timestamp`)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&turn.user_id)
        .bind(&turn.session_id)
        .bind(&turn.text)
        .bind(turn.sender.to_string())
        .bind(turn.timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        debug!("Saved {} message #{} for session {}", turn.sender, id, turn.session_id);
        Ok(id)
    }

    async fn history(&self, user_id: &str, session_id: &str) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, `text`, sender, `timestamp`
            FROM chat_messages
            WHERE user_id = ? AND session_id = ?
            ORDER BY `timestamp` ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredMessage::try_from).collect()
    }

    async fn clear(&self, user_id: &str, session_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE user_id = ? AND session_id = ?")
            .bind(user_id)
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                MIN(`timestamp`) AS created_at,
                COUNT(*) AS message_count
            FROM chat_messages
            WHERE user_id = ?
            GROUP BY session_id
            ORDER BY MAX(`timestamp`) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SessionSummary {
                session_id: row.session_id,
                created_at: row.created_at,
                message_count: row.message_count,
            })
            .collect())
    }
}
