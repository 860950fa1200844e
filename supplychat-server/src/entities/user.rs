use crate::entities::{dao::NewUser, dao::UserRecord, SqliteStore};
use std::future::Future;

type UserRow = (i64, String, String, String, Option<String>, Option<String>);

pub trait UserStore: Send + Sync + 'static {
    /// Exact-match lookup; usernames are unique.
    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn insert_user(
        &self,
        user: NewUser,
    ) -> impl Future<Output = Result<UserRecord, sqlx::Error>> + Send;
}

impl UserStore for SqliteStore {
    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, hashed_password, role, location, description \
             FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(
            |(id, username, hashed_password, role, location, description)| UserRecord {
                id,
                username,
                hashed_password,
                role,
                location,
                description,
            },
        ))
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (username, hashed_password, role, location, description) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.username)
        .bind(&user.hashed_password)
        .bind(&user.role)
        .bind(&user.location)
        .bind(&user.description)
        .execute(&self.pool)
        .await?;
        Ok(UserRecord {
            id: result.last_insert_rowid(),
            username: user.username,
            hashed_password: user.hashed_password,
            role: user.role,
            location: user.location,
            description: user.description,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::fixtures::store_with_users;

    #[tokio::test]
    async fn lookup_is_exact() {
        let (store, users) = store_with_users(&["manager"]).await;
        let found = store.get_user_by_username("manager").await.unwrap().unwrap();
        assert_eq!(found.id, users[0].id);
        assert!(store.get_user_by_username("Manager").await.unwrap().is_none());
        assert!(store.get_user_by_username("manage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let (store, _) = store_with_users(&["manager"]).await;
        let err = store
            .insert_user(NewUser {
                username: "manager".into(),
                hashed_password: "x".into(),
                role: "other".into(),
                location: None,
                description: None,
            })
            .await;
        assert!(err.is_err());
    }
}
