//! Session payloads.
//!
//! `/sessions` reports RFC 3339 times; the summary and detail views use
//! epoch seconds.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{ChatMessage, ChatSession};

/// One entry of `GET /sessions`, also returned by `POST /new-session`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionOut {
    pub session_id: String,
    pub username: String,
    pub session_name: String,
    pub created_at: String,
}

/// One entry of `GET /get-sessions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    /// Epoch seconds.
    pub created_at: i64,
    pub user_id: i64,
    pub username: String,
    pub message_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionMessage {
    pub id: i64,
    pub role: String,
    pub content: String,
    /// Epoch seconds.
    pub created_at: i64,
}

/// Response for `GET /sessions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionDetail {
    pub session_id: String,
    pub title: String,
    /// Epoch seconds.
    pub created_at: i64,
    pub user_id: i64,
    pub username: String,
    pub messages: Vec<SessionMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteSessionResponse {
    pub message: String,
}

impl ChatSession {
    pub fn to_out(&self, name: String) -> SessionOut {
        SessionOut {
            session_id: self.id.clone(),
            username: self.username.clone(),
            session_name: name,
            created_at: self.created_at.to_rfc3339(),
        }
    }

    pub fn to_summary(&self, title: String, message_count: i64) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            title,
            created_at: self.created_at.timestamp(),
            user_id: self.user_id,
            username: self.username.clone(),
            message_count,
        }
    }

    pub fn to_detail(&self, title: String, messages: &[ChatMessage]) -> SessionDetail {
        SessionDetail {
            session_id: self.id.clone(),
            title,
            created_at: self.created_at.timestamp(),
            user_id: self.user_id,
            username: self.username.clone(),
            messages: messages
                .iter()
                .map(|m| SessionMessage {
                    id: m.id,
                    role: m.role.to_string(),
                    content: m.content.clone(),
                    created_at: m.created_at.timestamp(),
                })
                .collect(),
        }
    }
}
