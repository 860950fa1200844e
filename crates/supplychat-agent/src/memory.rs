//! Bounded per-user conversational memory, persisted in SQLite.
//!
//! Memory lives in its own database (`SUPPLYCHAT_AGENT_MEMORY_DB` in the
//! server) so it survives restarts without touching the chat schema. Only the
//! last `max_exchanges` question/answer pairs per user are kept on disk.

use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::warn;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS agent_memory (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    username   TEXT NOT NULL,
    role       TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_agent_memory_username ON agent_memory (username, id);";

/// Author of a remembered turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Agent,
}

impl TurnRole {
    fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Agent => "agent",
        }
    }
}

/// One remembered utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Agent,
            content: content.into(),
        }
    }
}

/// Keeps the last `max_exchanges` question/answer pairs for every user.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    pool: SqlitePool,
    max_exchanges: usize,
}

impl ConversationMemory {
    /// Open (or create) the memory database at `url`, e.g.
    /// `"sqlite://supplychat-memory.db"`.
    pub async fn open(url: &str, max_exchanges: usize) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool, max_exchanges).await
    }

    /// A private in-memory database; nothing outlives the value.
    pub async fn in_memory(max_exchanges: usize) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool, max_exchanges).await
    }

    async fn bootstrap(pool: SqlitePool, max_exchanges: usize) -> Result<Self, sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self {
            pool,
            max_exchanges,
        })
    }

    fn max_turns(&self) -> i64 {
        i64::try_from(self.max_exchanges.saturating_mul(2)).unwrap_or(i64::MAX)
    }

    /// The remembered turns for `username`, oldest first.
    pub async fn history(&self, username: &str) -> Result<Vec<Turn>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT role, content FROM (
                 SELECT id, role, content FROM agent_memory
                 WHERE username = ?1 ORDER BY id DESC LIMIT ?2
             ) ORDER BY id ASC",
        )
        .bind(username)
        .bind(self.max_turns())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(role, content)| match role.as_str() {
                "user" => Turn::user(content),
                "agent" => Turn::agent(content),
                other => {
                    warn!(role = %other, "unknown memory role; treating as agent");
                    Turn::agent(content)
                }
            })
            .collect())
    }

    /// Remember one completed exchange and drop turns beyond capacity.
    pub async fn record(
        &self,
        username: &str,
        query: &str,
        reply: &str,
    ) -> Result<(), sqlx::Error> {
        if self.max_exchanges == 0 {
            return Ok(());
        }
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let mut tx = self.pool.begin().await?;
        for turn in [Turn::user(query), Turn::agent(reply)] {
            sqlx::query(
                "INSERT INTO agent_memory (username, role, content, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(username)
            .bind(turn.role.as_str())
            .bind(&turn.content)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        sqlx::query(
            "DELETE FROM agent_memory WHERE username = ?1 AND id NOT IN (
                 SELECT id FROM agent_memory WHERE username = ?1 ORDER BY id DESC LIMIT ?2
             )",
        )
        .bind(username)
        .bind(self.max_turns())
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }
}
