//! Message payloads.
//!
//! Chat-view timestamps are epoch milliseconds.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::entities::{ChatMessage, MessageRole, UserRecord};

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_LEN: u64 = 16 * 1024;

/// Body for `POST /send-message`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SendMessageRequest {
    #[validate(
        length(max = MAX_MESSAGE_LEN, message = "text is too long"),
        custom(function = "not_blank")
    )]
    pub text: String,
    /// Continue this session; a new one is opened when absent.
    #[serde(default)]
    pub session_id: Option<String>,
}

fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("text must not be empty".into()));
    }
    Ok(())
}

/// A stored message as the chat view renders it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaygroundMessage {
    /// `"user"` or `"agent"`.
    pub role: String,
    pub content: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Set on user messages only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    pub session_id: Option<String>,
}

/// Response for `POST /send-message`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    /// The agent's reply text.
    pub response: String,
    pub session_id: String,
    pub user_message: PlaygroundMessage,
    pub agent_message: PlaygroundMessage,
}

impl ChatMessage {
    pub fn to_playground(&self, owner: &UserRecord) -> PlaygroundMessage {
        PlaygroundMessage {
            role: self.role.to_string(),
            content: self.content.clone(),
            created_at: self.created_at.timestamp_millis(),
            username: (self.role == MessageRole::User).then(|| owner.username.clone()),
            session_id: self.session_id.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn request(text: &str) -> SendMessageRequest {
        SendMessageRequest {
            text: text.into(),
            session_id: None,
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(request("   \n").validate().is_err());
        assert!(request("").validate().is_err());
        assert!(request("hello").validate().is_ok());
    }

    #[test]
    fn oversized_text_is_rejected() {
        let long = "x".repeat(MAX_MESSAGE_LEN as usize + 1);
        assert!(request(&long).validate().is_err());
    }
}
