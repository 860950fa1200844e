//! Bearer-token authentication as an Axum extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use supplychat_agent::UserContext;
use tracing::debug;

use crate::entities::{UserRecord, UserStore};
use crate::error::ServerError;
use crate::state::AppState;

/// The authenticated caller. Adding it to a handler's arguments makes the
/// route require a valid access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

impl CurrentUser {
    /// The facts the agent's system prompt is rendered with.
    pub fn context(&self) -> UserContext {
        UserContext {
            username: self.0.username.clone(),
            role: self.0.role.clone(),
            location: self.0.location.clone(),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::Unauthorized("missing bearer token".into()))?;

        let claims = state.tokens.validate(token).map_err(|e| {
            debug!(error = %e, "rejected access token");
            ServerError::Unauthorized("invalid token".into())
        })?;

        // The user may have been removed since the token was issued.
        let user = state
            .store
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or_else(|| ServerError::Unauthorized("invalid token".into()))?;

        Ok(CurrentUser(user))
    }
}
