use crate::entities::{
    dao::{ChatMessage, MessageRole, NewMessage},
    from_db_time, to_db_time, SqliteStore,
};
use chrono::Utc;
use std::future::Future;

type MessageRow = (i64, Option<String>, String, String, String);

fn from_row((id, session_id, role, content, created_at): MessageRow) -> ChatMessage {
    let role = role.parse().unwrap_or_else(|_| {
        tracing::warn!(id, raw = %role, "unknown message role; treating as agent");
        MessageRole::Agent
    });
    ChatMessage {
        id,
        session_id,
        role,
        content,
        created_at: from_db_time(&created_at),
    }
}

const SELECT_MESSAGE: &str =
    "SELECT id, session_id, role, content, created_at FROM chat_messages";

/// Message persistence. Messages are append-only; every list is
/// chronological, ties broken by insertion order.
pub trait ChatStore: Send + Sync + 'static {
    fn append_message(
        &self,
        msg: NewMessage,
    ) -> impl Future<Output = Result<ChatMessage, sqlx::Error>> + Send;
    fn list_session_messages(
        &self,
        session_id: &str,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, sqlx::Error>> + Send;
    fn list_user_messages(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, sqlx::Error>> + Send;
    fn first_user_message(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Option<ChatMessage>, sqlx::Error>> + Send;
    fn count_session_messages(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl ChatStore for SqliteStore {
    async fn append_message(&self, msg: NewMessage) -> Result<ChatMessage, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO chat_messages (user_id, session_id, role, content, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(msg.user_id)
        .bind(&msg.session_id)
        .bind(msg.role.as_ref())
        .bind(&msg.content)
        .bind(to_db_time(&created_at))
        .execute(&self.pool)
        .await?;
        Ok(ChatMessage {
            id: result.last_insert_rowid(),
            session_id: msg.session_id,
            role: msg.role,
            content: msg.content,
            created_at,
        })
    }

    async fn list_session_messages(
        &self,
        session_id: &str,
        user_id: i64,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "{SELECT_MESSAGE} WHERE session_id = ?1 AND user_id = ?2 \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn list_user_messages(&self, user_id: i64) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "{SELECT_MESSAGE} WHERE user_id = ?1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn first_user_message(
        &self,
        session_id: &str,
    ) -> Result<Option<ChatMessage>, sqlx::Error> {
        let row: Option<MessageRow> = sqlx::query_as(&format!(
            "{SELECT_MESSAGE} WHERE session_id = ?1 AND role = 'user' \
             ORDER BY created_at ASC, id ASC LIMIT 1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn count_session_messages(&self, session_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?1")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
