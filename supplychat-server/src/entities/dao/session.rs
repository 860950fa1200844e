use chrono::{DateTime, Utc};

/// A row in the `chat_sessions` table.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: String,
    pub user_id: i64,
    pub username: String,
    /// Display name; a placeholder until the first user message arrives.
    pub name: String,
    pub created_at: DateTime<Utc>,
}
