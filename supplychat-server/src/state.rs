//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use supplychat_agent::AgentGateway;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::entities::SqliteStore;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Users, sessions and messages.
    pub store: Arc<SqliteStore>,
    /// The one conversational agent every request talks to.
    pub agent: Arc<AgentGateway>,
    /// Issues and validates access tokens.
    pub tokens: Arc<TokenIssuer>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use supplychat_agent::{
        AgentBackend, AgentError, AgentRequest, ConversationMemory, GatewayOptions,
    };

    use super::*;
    use crate::auth::password::hash_password;
    use crate::entities::{NewUser, UserRecord, UserStore};

    /// Replies `"agent: <query>"` and remembers every query it saw.
    #[derive(Default)]
    pub struct EchoAgent {
        pub queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AgentBackend for EchoAgent {
        async fn complete(&self, request: AgentRequest<'_>) -> Result<String, AgentError> {
            self.queries.lock().unwrap().push(request.query.to_owned());
            Ok(format!("agent: {}", request.query))
        }
    }

    pub struct BrokenAgent;

    #[async_trait]
    impl AgentBackend for BrokenAgent {
        async fn complete(&self, _request: AgentRequest<'_>) -> Result<String, AgentError> {
            Err(AgentError::Backend("model unavailable".into()))
        }
    }

    pub async fn gateway(backend: Arc<dyn AgentBackend>) -> AgentGateway {
        AgentGateway::with_backend(
            GatewayOptions {
                prompt_path: PathBuf::from("/nonexistent/supplychat/system.md"),
                timeout: Duration::from_secs(5),
                memory: ConversationMemory::in_memory(4).await.unwrap(),
            },
            backend,
        )
    }

    pub async fn state_with(backend: Arc<dyn AgentBackend>) -> Arc<AppState> {
        let config = Config {
            enable_swagger: false,
            ..Config::default()
        };
        Arc::new(AppState {
            tokens: Arc::new(TokenIssuer::new(b"test-secret", config.token_ttl_secs)),
            config: Arc::new(config),
            store: Arc::new(SqliteStore::in_memory().await.unwrap()),
            agent: Arc::new(gateway(backend).await),
        })
    }

    pub async fn state() -> Arc<AppState> {
        state_with(Arc::new(EchoAgent::default())).await
    }

    /// Provision a user whose password is `<username>123`.
    pub async fn add_user(state: &AppState, username: &str, location: Option<&str>) -> UserRecord {
        state
            .store
            .insert_user(NewUser {
                username: username.to_owned(),
                hashed_password: hash_password(&format!("{username}123")).unwrap(),
                role: username.to_owned(),
                location: location.map(str::to_owned),
                description: Some(format!("{username} account")),
            })
            .await
            .unwrap()
    }
}
