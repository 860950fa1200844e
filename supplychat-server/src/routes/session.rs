use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::entities::{ChatStore, SessionStore};
use crate::error::ServerError;
use crate::middleware::auth::CurrentUser;
use crate::schemas::session::{
    DeleteSessionResponse, SessionDetail, SessionMessage, SessionOut, SessionSummary,
};
use crate::services::session::{self as sessions, NEW_CHAT_NAME};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(new_session, list_sessions, list_session_summaries, get_session, delete_session),
    components(schemas(
        SessionOut,
        SessionSummary,
        SessionDetail,
        SessionMessage,
        DeleteSessionResponse
    ))
)]
pub struct SessionApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/new-session", post(new_session))
        .route("/sessions", get(list_sessions))
        .route("/get-sessions", get(list_session_summaries))
        .route("/sessions/{id}", get(get_session))
        .route("/delete-session/{id}", delete(delete_session))
}

#[utoipa::path(
    post,
    path = "/new-session",
    tag = "sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session created", body = SessionOut),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn new_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<SessionOut>, ServerError> {
    let session = sessions::create_session(state.store.as_ref(), &user.0, NEW_CHAT_NAME).await?;
    Ok(Json(session.to_out(session.name.clone())))
}

/// The caller's sessions, newest first, named by their display title.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session list", body = Vec<SessionOut>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<SessionOut>>, ServerError> {
    let store = state.store.as_ref();
    let mut out = Vec::new();
    for session in store.list_sessions(user.0.id).await? {
        let title = sessions::session_title(store, &session).await?;
        out.push(session.to_out(title));
    }
    Ok(Json(out))
}

/// Like `/sessions`, with message counts and epoch-second timestamps.
#[utoipa::path(
    get,
    path = "/get-sessions",
    tag = "sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session summaries", body = Vec<SessionSummary>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_session_summaries(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<SessionSummary>>, ServerError> {
    let store = state.store.as_ref();
    let mut out = Vec::new();
    for session in store.list_sessions(user.0.id).await? {
        let title = sessions::session_title(store, &session).await?;
        let count = store.count_session_messages(&session.id).await?;
        out.push(session.to_summary(title, count));
    }
    Ok(Json(out))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session with its messages", body = SessionDetail),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, ServerError> {
    let store = state.store.as_ref();
    let session = sessions::owned_session(store, &user.0, &id).await?;
    let messages = store.list_session_messages(&session.id, user.0.id).await?;
    let title = sessions::session_title(store, &session).await?;
    Ok(Json(session.to_detail(title, &messages)))
}

/// Delete a session together with its messages.
#[utoipa::path(
    delete,
    path = "/delete-session/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session deleted", body = DeleteSessionResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ServerError> {
    sessions::delete_session(state.store.as_ref(), &user.0, &id).await?;
    Ok(Json(DeleteSessionResponse {
        message: "Session deleted successfully".into(),
    }))
}
