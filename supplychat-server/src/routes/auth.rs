use axum::extract::State;
use axum::routing::post;
use axum::{Form, Json, Router};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::auth::password::verify_or_burn;
use crate::entities::UserStore;
use crate::error::ServerError;
use crate::schemas::auth::{LoginForm, LoginResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(login), components(schemas(LoginForm, LoginResponse)))]
pub struct AuthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Exchange a username and password for an access token.
///
/// Unknown users and wrong passwords get the same response.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password"),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state.store.get_user_by_username(&form.username).await?;

    let hashed = user.as_ref().map(|u| u.hashed_password.clone());
    let password = form.password;
    let verified = tokio::task::spawn_blocking(move || verify_or_burn(&password, hashed.as_deref()))
        .await
        .map_err(|e| ServerError::Internal(format!("password check panicked: {e}")))?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!(username = %form.username, "login rejected");
            return Err(ServerError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    let token = state
        .tokens
        .issue(&user.username, &user.role)
        .map_err(|e| ServerError::Internal(format!("failed to sign token: {e}")))?;
    info!(username = %user.username, "user logged in");

    Ok(Json(LoginResponse::new(&user, token, state.tokens.ttl_secs())))
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;

    use crate::routes::build;
    use crate::routes::test_client::{call, login_request};
    use crate::state::test_support::{add_user, state};

    #[tokio::test]
    async fn valid_credentials_return_profile_and_token() {
        let state = state().await;
        add_user(&state, "manager", Some("New York")).await;
        let app = build(state.clone());

        let (status, body) = call(&app, login_request("manager", "manager123")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["role"], "manager");
        assert_eq!(body["location"], "New York");
        assert_eq!(body["description"], "manager account");
        assert_eq!(body["expires_in"], state.tokens.ttl_secs());

        let claims = state.tokens.validate(body["access_token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.sub, "manager");
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let state = state().await;
        add_user(&state, "manager", None).await;
        let app = build(state);

        let (wrong_status, wrong_body) = call(&app, login_request("manager", "nope")).await;
        let (unknown_status, unknown_body) = call(&app, login_request("ghost", "manager123")).await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn username_match_is_exact() {
        let state = state().await;
        add_user(&state, "manager", None).await;
        let app = build(state);

        let (status, _) = call(&app, login_request("Manager", "manager123")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
