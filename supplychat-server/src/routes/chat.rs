use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use validator::Validate;

use crate::entities::ChatStore;
use crate::error::ServerError;
use crate::middleware::auth::CurrentUser;
use crate::schemas::chat::{PlaygroundMessage, SendMessageRequest, SendMessageResponse};
use crate::services::chat::send_message as run_send;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(send_message, get_chat, get_messages),
    components(schemas(SendMessageRequest, SendMessageResponse, PlaygroundMessage))
)]
pub struct ChatApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/send-message", post(send_message))
        .route("/chats/{session_id}", get(get_chat))
        .route("/get-messages", get(get_messages))
}

/// Send a message to the agent, opening a session when none is given.
///
/// Agent failures still answer 200, with an apology as the reply.
#[utoipa::path(
    post,
    path = "/send-message",
    tag = "chat",
    request_body = SendMessageRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Both messages stored", body = SendMessageResponse),
        (status = 400, description = "Empty or oversized text"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Failed to process message"),
    )
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ServerError> {
    req.validate()?;
    let outcome = run_send(&state, &user, &req.text, req.session_id.as_deref()).await?;

    Ok(Json(SendMessageResponse {
        response: outcome.agent_message.content.clone(),
        session_id: outcome.session.id.clone(),
        user_message: outcome.user_message.to_playground(&user.0),
        agent_message: outcome.agent_message.to_playground(&user.0),
    }))
}

/// The caller's messages in one session, oldest first.
#[utoipa::path(
    get,
    path = "/chats/{session_id}",
    tag = "chat",
    params(("session_id" = String, Path, description = "Session id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session messages", body = Vec<PlaygroundMessage>),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No messages for this session"),
    )
)]
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<PlaygroundMessage>>, ServerError> {
    let messages = state.store.list_session_messages(&session_id, user.0.id).await?;
    if messages.is_empty() {
        return Err(ServerError::NotFound("no messages found for this session".into()));
    }
    Ok(Json(messages.iter().map(|m| m.to_playground(&user.0)).collect()))
}

/// Every message the caller has, across sessions, oldest first.
#[utoipa::path(
    get,
    path = "/get-messages",
    tag = "chat",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All of the caller's messages", body = Vec<PlaygroundMessage>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<PlaygroundMessage>>, ServerError> {
    let messages = state.store.list_user_messages(user.0.id).await?;
    Ok(Json(messages.iter().map(|m| m.to_playground(&user.0)).collect()))
}
