//! Health endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Liveness check. Reports whether the agent backend has been built yet;
/// a lazily initialised agent is still healthy.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = Value)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "agent_initialized": state.agent.is_initialized(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::test_support::state;

    #[tokio::test]
    async fn health_reports_agent_state() {
        let state = state().await;
        let Json(body) = get_health(State(state.clone())).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["agent_initialized"], false);
        assert!(!body["version"].as_str().unwrap_or("").is_empty());

        state.agent.initialize().await.unwrap();
        let Json(body) = get_health(State(state)).await;
        assert_eq!(body["agent_initialized"], true);
    }
}
