use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display, EnumString};

/// Author of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// A row in the `chat_messages` table. Never updated after insertion.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: i64,
    /// `None` for legacy messages recorded outside any session.
    pub session_id: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Values for appending a message; id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: i64,
    pub session_id: Option<String>,
    pub role: MessageRole,
    pub content: String,
}
