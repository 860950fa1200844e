//! The message-send flow.
//!
//! 1. resolve or create the session,
//! 2. store the user message and name the session after it,
//! 3. ask the agent (which never fails),
//! 4. store the agent reply.
//!
//! No transaction spans the flow: messages committed before a failure stay
//! committed.

use tracing::{error, info};

use crate::entities::{ChatMessage, ChatSession, ChatStore, MessageRole, NewMessage};
use crate::error::ServerError;
use crate::middleware::auth::CurrentUser;
use crate::services::session::{get_or_create_session, rename_if_placeholder};
use crate::state::AppState;

/// Everything persisted by one successful send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub session: ChatSession,
    pub user_message: ChatMessage,
    pub agent_message: ChatMessage,
}

pub async fn send_message(
    state: &AppState,
    caller: &CurrentUser,
    text: &str,
    session_id: Option<&str>,
) -> Result<SendOutcome, ServerError> {
    let user = &caller.0;
    let store = state.store.as_ref();

    let mut session = get_or_create_session(store, user, session_id)
        .await
        .map_err(processing_failure)?;

    let user_message = store
        .append_message(NewMessage {
            user_id: user.id,
            session_id: Some(session.id.clone()),
            role: MessageRole::User,
            content: text.to_owned(),
        })
        .await
        .map_err(|e| processing_failure(e.into()))?;

    rename_if_placeholder(store, &mut session)
        .await
        .map_err(|e| processing_failure(e.into()))?;

    let reply = state.agent.respond(text, &caller.context()).await;

    let agent_message = store
        .append_message(NewMessage {
            user_id: user.id,
            session_id: Some(session.id.clone()),
            role: MessageRole::Agent,
            content: reply,
        })
        .await
        .map_err(|e| processing_failure(e.into()))?;

    info!(
        session_id = %session.id,
        username = %user.username,
        reply_len = agent_message.content.len(),
        "message exchanged"
    );

    Ok(SendOutcome {
        session,
        user_message,
        agent_message,
    })
}

/// Caller-facing errors pass through; anything else becomes a generic
/// processing failure.
fn processing_failure(e: ServerError) -> ServerError {
    match e {
        ServerError::NotFound(_) | ServerError::Unauthorized(_) | ServerError::BadRequest(_) => e,
        other => {
            error!(error = %other, "send-message flow failed");
            ServerError::Processing(other.to_string())
        }
    }
}
