/// A row in the `users` table.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string.
    pub hashed_password: String,
    pub role: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Values for provisioning a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub hashed_password: String,
    pub role: String,
    pub location: Option<String>,
    pub description: Option<String>,
}
