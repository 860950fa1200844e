//! Session lifecycle rules: ownership, placeholder names and display titles.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{ChatSession, ChatStore, SessionStore, UserRecord};
use crate::error::ServerError;

/// Name given to a session created implicitly by the first message.
pub const LOADING_NAME: &str = "Loading...";
/// Name given to a session created explicitly, and the fallback title.
pub const NEW_CHAT_NAME: &str = "New Chat";

pub fn is_placeholder(name: &str) -> bool {
    name == LOADING_NAME || name == NEW_CHAT_NAME
}

pub async fn create_session<S: SessionStore>(
    store: &S,
    user: &UserRecord,
    name: &str,
) -> Result<ChatSession, sqlx::Error> {
    let session = ChatSession {
        id: Uuid::new_v4().to_string(),
        user_id: user.id,
        username: user.username.clone(),
        name: name.to_owned(),
        created_at: Utc::now(),
    };
    store.create_session(session.clone()).await?;
    info!(session_id = %session.id, username = %user.username, "session created");
    Ok(session)
}

/// The caller's session `id`, or NotFound. Foreign and unknown ids are
/// indistinguishable.
pub async fn owned_session<S: SessionStore>(
    store: &S,
    user: &UserRecord,
    id: &str,
) -> Result<ChatSession, ServerError> {
    store
        .get_session(id, user.id)
        .await?
        .ok_or_else(|| ServerError::NotFound("session not found".into()))
}

/// Resolve `session_id` for `user`, or open a new session when none is
/// given. A blank id counts as none.
pub async fn get_or_create_session<S: SessionStore>(
    store: &S,
    user: &UserRecord,
    session_id: Option<&str>,
) -> Result<ChatSession, ServerError> {
    match session_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => owned_session(store, user, id).await,
        None => Ok(create_session(store, user, LOADING_NAME).await?),
    }
}

/// Replace a placeholder name with the session's first user message.
///
/// No-op once the name is real or while the session has no user message.
/// Returns whether the name changed.
pub async fn rename_if_placeholder<S: SessionStore + ChatStore>(
    store: &S,
    session: &mut ChatSession,
) -> Result<bool, sqlx::Error> {
    if !is_placeholder(&session.name) {
        return Ok(false);
    }
    let Some(first) = store.first_user_message(&session.id).await? else {
        return Ok(false);
    };
    store.rename_session(&session.id, &first.content).await?;
    debug!(session_id = %session.id, "session renamed from first message");
    session.name = first.content;
    Ok(true)
}

/// Display title: first user message, else a non-placeholder stored name,
/// else [`NEW_CHAT_NAME`].
pub async fn session_title<S: ChatStore>(
    store: &S,
    session: &ChatSession,
) -> Result<String, sqlx::Error> {
    if let Some(first) = store.first_user_message(&session.id).await? {
        if !first.content.is_empty() {
            return Ok(first.content);
        }
    }
    if !session.name.is_empty() && !is_placeholder(&session.name) {
        return Ok(session.name.clone());
    }
    Ok(NEW_CHAT_NAME.to_owned())
}

/// Delete the caller's session and its messages.
pub async fn delete_session<S: SessionStore>(
    store: &S,
    user: &UserRecord,
    id: &str,
) -> Result<(), ServerError> {
    if !store.delete_session(id, user.id).await? {
        return Err(ServerError::NotFound("session not found".into()));
    }
    info!(session_id = %id, username = %user.username, "session deleted");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::fixtures::store_with_users;
    use crate::entities::{MessageRole, NewMessage, SqliteStore};

    async fn say(store: &SqliteStore, session: &ChatSession, role: MessageRole, text: &str) {
        store
            .append_message(NewMessage {
                user_id: session.user_id,
                session_id: Some(session.id.clone()),
                role,
                content: text.into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_id_creates_loading_session() {
        let (store, users) = store_with_users(&["manager"]).await;
        let session = get_or_create_session(&store, &users[0], None).await.unwrap();
        assert_eq!(session.name, LOADING_NAME);
        assert_eq!(store.list_sessions(users[0].id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_id_creates_a_session() {
        let (store, users) = store_with_users(&["manager"]).await;
        get_or_create_session(&store, &users[0], Some("  ")).await.unwrap();
        assert_eq!(store.list_sessions(users[0].id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn existing_id_is_reused() {
        let (store, users) = store_with_users(&["manager"]).await;
        let created = create_session(&store, &users[0], NEW_CHAT_NAME).await.unwrap();
        let found = get_or_create_session(&store, &users[0], Some(created.id.as_str()))
            .await
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(store.list_sessions(users[0].id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn foreign_id_is_not_found() {
        let (store, users) = store_with_users(&["manager", "finance"]).await;
        let theirs = create_session(&store, &users[1], NEW_CHAT_NAME).await.unwrap();
        let err = get_or_create_session(&store, &users[0], Some(theirs.id.as_str()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
        assert!(store.list_sessions(users[0].id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rename_happens_once() {
        let (store, users) = store_with_users(&["manager"]).await;
        let mut session = create_session(&store, &users[0], LOADING_NAME).await.unwrap();

        assert!(!rename_if_placeholder(&store, &mut session).await.unwrap());

        say(&store, &session, MessageRole::User, "What is our Q1 inventory?").await;
        assert!(rename_if_placeholder(&store, &mut session).await.unwrap());
        assert_eq!(session.name, "What is our Q1 inventory?");

        say(&store, &session, MessageRole::User, "And Q2?").await;
        assert!(!rename_if_placeholder(&store, &mut session).await.unwrap());
        let stored = store.get_session(&session.id, users[0].id).await.unwrap().unwrap();
        assert_eq!(stored.name, "What is our Q1 inventory?");
    }

    #[tokio::test]
    async fn title_resolution_order() {
        let (store, users) = store_with_users(&["manager"]).await;

        let fresh = create_session(&store, &users[0], NEW_CHAT_NAME).await.unwrap();
        assert_eq!(session_title(&store, &fresh).await.unwrap(), NEW_CHAT_NAME);

        let named = create_session(&store, &users[0], "Freight review").await.unwrap();
        assert_eq!(session_title(&store, &named).await.unwrap(), "Freight review");

        say(&store, &named, MessageRole::Agent, "Hello").await;
        say(&store, &named, MessageRole::User, "Port delays?").await;
        assert_eq!(session_title(&store, &named).await.unwrap(), "Port delays?");
    }

    #[tokio::test]
    async fn delete_of_foreign_session_is_not_found() {
        let (store, users) = store_with_users(&["manager", "finance"]).await;
        let session = create_session(&store, &users[0], NEW_CHAT_NAME).await.unwrap();

        let err = delete_session(&store, &users[1], &session.id).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
        delete_session(&store, &users[0], &session.id).await.unwrap();
        assert!(store.get_session(&session.id, users[0].id).await.unwrap().is_none());
    }
}
