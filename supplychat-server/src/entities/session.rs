use crate::entities::{dao::ChatSession, from_db_time, to_db_time, SqliteStore};
use std::future::Future;

type SessionRow = (String, i64, String, String, String);

fn from_row((id, user_id, username, name, created_at): SessionRow) -> ChatSession {
    ChatSession {
        id,
        user_id,
        username,
        name,
        created_at: from_db_time(&created_at),
    }
}

/// Session persistence. Every read and delete is scoped to the owning user,
/// so a foreign session id behaves exactly like an unknown one.
pub trait SessionStore: Send + Sync + 'static {
    fn create_session(
        &self,
        session: ChatSession,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_session(
        &self,
        id: &str,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<ChatSession>, sqlx::Error>> + Send;
    /// Most recent first.
    fn list_sessions(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<ChatSession>, sqlx::Error>> + Send;
    fn rename_session(
        &self,
        id: &str,
        name: &str,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Delete the session and its messages. Returns `false` when nothing
    /// owned by `user_id` matched.
    fn delete_session(
        &self,
        id: &str,
        user_id: i64,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

impl SessionStore for SqliteStore {
    async fn create_session(&self, session: ChatSession) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, username, name, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(&session.username)
        .bind(&session.name)
        .bind(to_db_time(&session.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(
        &self,
        id: &str,
        user_id: i64,
    ) -> Result<Option<ChatSession>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, username, name, created_at \
             FROM chat_sessions WHERE id = ?1 AND user_id = ?2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<ChatSession>, sqlx::Error> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, username, name, created_at \
             FROM chat_sessions WHERE user_id = ?1 \
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn rename_session(&self, id: &str, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE chat_sessions SET name = ?1 WHERE id = ?2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str, user_id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM chat_sessions WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        // Messages go with the session even on connections without `foreign_keys`.
        sqlx::query("DELETE FROM chat_messages WHERE session_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::fixtures::store_with_users;
    use chrono::{Duration, Utc};

    fn session(id: &str, user_id: i64, offset_secs: i64) -> ChatSession {
        ChatSession {
            id: id.into(),
            user_id,
            username: "u".into(),
            name: "New Chat".into(),
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn get_is_scoped_to_owner() {
        let (store, users) = store_with_users(&["manager", "finance"]).await;
        store.create_session(session("s1", users[0].id, 0)).await.unwrap();

        assert!(store.get_session("s1", users[0].id).await.unwrap().is_some());
        assert!(store.get_session("s1", users[1].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_most_recent_first() {
        let (store, users) = store_with_users(&["manager", "finance"]).await;
        store.create_session(session("old", users[0].id, -60)).await.unwrap();
        store.create_session(session("new", users[0].id, 0)).await.unwrap();
        store.create_session(session("other", users[1].id, 30)).await.unwrap();

        let ids: Vec<String> = store
            .list_sessions(users[0].id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_a_miss() {
        let (store, users) = store_with_users(&["manager", "finance"]).await;
        store.create_session(session("s1", users[0].id, 0)).await.unwrap();

        assert!(!store.delete_session("s1", users[1].id).await.unwrap());
        assert!(store.delete_session("s1", users[0].id).await.unwrap());
        assert!(!store.delete_session("s1", users[0].id).await.unwrap());
    }
}
