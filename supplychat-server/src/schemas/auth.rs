use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::UserRecord;

/// Form body for `POST /login`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub role: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl LoginResponse {
    pub fn new(user: &UserRecord, access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
            expires_in,
            role: user.role.clone(),
            location: user.location.clone(),
            description: user.description.clone(),
        }
    }
}
