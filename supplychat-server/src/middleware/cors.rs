use crate::state::AppState;
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// CORS policy from `SUPPLYCHAT_CORS_ORIGINS`.
///
/// An explicit origin list allows credentials, which requires explicit
/// method and header lists as well. No list means any origin, no credentials.
pub fn cors_layer(state: Arc<AppState>) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .as_deref()
        .map(|list| {
            list.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(Any);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
