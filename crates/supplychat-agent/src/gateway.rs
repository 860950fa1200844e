//! The shared agent gateway.
//!
//! One [`AgentGateway`] is built by the server's composition root and shared
//! behind an `Arc`. The backend itself is constructed lazily on the first
//! call, or eagerly through [`AgentGateway::initialize`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::backend::{AgentBackend, AgentRequest};
use crate::error::AgentError;
use crate::memory::ConversationMemory;
use crate::prompt::PromptTemplate;
use crate::UserContext;

/// Builds the backend on first use.
pub type BackendFactory =
    Box<dyn Fn() -> Result<Arc<dyn AgentBackend>, AgentError> + Send + Sync>;

/// Tunables for [`AgentGateway`].
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Path of the system prompt template, re-read on every call.
    pub prompt_path: PathBuf,
    /// Deadline for a single backend call.
    pub timeout: Duration,
    /// Per-user history sent with every call.
    pub memory: ConversationMemory,
}

pub struct AgentGateway {
    factory: BackendFactory,
    backend: OnceCell<Arc<dyn AgentBackend>>,
    prompt: PromptTemplate,
    memory: ConversationMemory,
    timeout: Duration,
}

impl fmt::Debug for AgentGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentGateway")
            .field("initialized", &self.is_initialized())
            .field("prompt", &self.prompt.path())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AgentGateway {
    pub fn new<F>(options: GatewayOptions, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn AgentBackend>, AgentError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            backend: OnceCell::new(),
            prompt: PromptTemplate::new(options.prompt_path),
            memory: options.memory,
            timeout: options.timeout,
        }
    }

    /// Gateway around an already constructed backend.
    pub fn with_backend(options: GatewayOptions, backend: Arc<dyn AgentBackend>) -> Self {
        Self::new(options, move || Ok(Arc::clone(&backend)))
    }

    /// Construct the backend now instead of on the first call.
    pub async fn initialize(&self) -> Result<(), AgentError> {
        self.backend().await.map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.initialized()
    }

    /// Ask the agent. Never fails: every error becomes an apology reply.
    pub async fn respond(&self, query: &str, user: &UserContext) -> String {
        match self.try_respond(query, user).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    username = %user.username,
                    error = %e,
                    "agent call failed; replying with apology"
                );
                apology(&e)
            }
        }
    }

    async fn try_respond(&self, query: &str, user: &UserContext) -> Result<String, AgentError> {
        let backend = self.backend().await?;
        let prompt = self.prompt.render(user, Local::now().date_naive()).await;
        let history = self.memory.history(&user.username).await.unwrap_or_else(|e| {
            warn!(
                username = %user.username,
                error = %e,
                "could not load agent memory; sending no history"
            );
            Vec::new()
        });
        let query = query.trim();

        let request = AgentRequest {
            system_prompt: &prompt.text,
            history: &history,
            query,
        };
        let reply = tokio::time::timeout(self.timeout, backend.complete(request))
            .await
            .map_err(|_| AgentError::Timeout(self.timeout))??;

        if let Err(e) = self.memory.record(&user.username, query, &reply).await {
            warn!(username = %user.username, error = %e, "could not save agent memory");
        }
        Ok(reply)
    }

    async fn backend(&self) -> Result<&Arc<dyn AgentBackend>, AgentError> {
        self.backend
            .get_or_try_init(|| async {
                let backend = (self.factory)()?;
                info!("agent backend initialised");
                Ok(backend)
            })
            .await
    }
}

/// The user-visible reply for a failed agent call.
pub fn apology(error: &AgentError) -> String {
    format!("I apologize, but I encountered an error processing your request: {error}")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::Turn;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Vec<Turn>, String)>>,
    }

    #[async_trait]
    impl AgentBackend for Recorder {
        async fn complete(&self, request: AgentRequest<'_>) -> Result<String, AgentError> {
            self.seen.lock().unwrap().push((
                request.system_prompt.to_owned(),
                request.history.to_vec(),
                request.query.to_owned(),
            ));
            Ok(format!("answer to {}", request.query))
        }
    }

    struct Failing;

    #[async_trait]
    impl AgentBackend for Failing {
        async fn complete(&self, _request: AgentRequest<'_>) -> Result<String, AgentError> {
            Err(AgentError::Backend("quota exceeded".into()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl AgentBackend for Stalled {
        async fn complete(&self, _request: AgentRequest<'_>) -> Result<String, AgentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    async fn options() -> GatewayOptions {
        options_with(ConversationMemory::in_memory(10).await.unwrap())
    }

    fn options_with(memory: ConversationMemory) -> GatewayOptions {
        GatewayOptions {
            prompt_path: PathBuf::from("/nonexistent/supplychat/system.md"),
            timeout: Duration::from_millis(200),
            memory,
        }
    }

    fn user() -> UserContext {
        UserContext {
            username: "manager".into(),
            role: "manager".into(),
            location: Some("NY".into()),
        }
    }

    #[tokio::test]
    async fn reply_is_returned_and_remembered() {
        let backend = Arc::new(Recorder::default());
        let gateway = AgentGateway::with_backend(options().await, backend.clone());

        assert_eq!(gateway.respond("  first  ", &user()).await, "answer to first");
        assert_eq!(gateway.respond("second", &user()).await, "answer to second");

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].2, "first");
        assert!(seen[0].1.is_empty());
        assert_eq!(
            seen[1].1,
            vec![Turn::user("first"), Turn::agent("answer to first")]
        );
    }

    #[tokio::test]
    async fn missing_template_uses_default_prompt() {
        let backend = Arc::new(Recorder::default());
        let gateway = AgentGateway::with_backend(options().await, backend.clone());
        gateway.respond("hi", &user()).await;
        assert_eq!(
            backend.seen.lock().unwrap()[0].0,
            crate::prompt::DEFAULT_SYSTEM_PROMPT
        );
    }

    #[tokio::test]
    async fn backend_failure_becomes_apology() {
        let gateway = AgentGateway::with_backend(options().await, Arc::new(Failing));
        let reply = gateway.respond("hi", &user()).await;
        assert!(reply.starts_with("I apologize, but I encountered an error"));
        assert!(reply.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let gateway = AgentGateway::with_backend(options().await, Arc::new(Stalled));
        let reply = gateway.respond("hi", &user()).await;
        assert!(reply.contains("timed out after 200ms"), "{reply}");
    }

    #[tokio::test]
    async fn failed_calls_are_not_remembered() {
        let memory = ConversationMemory::in_memory(10).await.unwrap();
        let gateway = AgentGateway::with_backend(options_with(memory.clone()), Arc::new(Failing));
        gateway.respond("hi", &user()).await;
        assert!(memory.history("manager").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_survives_a_rebuilt_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("memory.db").display());

        let first = AgentGateway::with_backend(
            options_with(ConversationMemory::open(&url, 10).await.unwrap()),
            Arc::new(Recorder::default()),
        );
        first.respond("where are the pallets?", &user()).await;
        drop(first);

        let backend = Arc::new(Recorder::default());
        let second = AgentGateway::with_backend(
            options_with(ConversationMemory::open(&url, 10).await.unwrap()),
            backend.clone(),
        );
        second.respond("and the forklifts?", &user()).await;

        assert_eq!(
            backend.seen.lock().unwrap()[0].1,
            vec![
                Turn::user("where are the pallets?"),
                Turn::agent("answer to where are the pallets?"),
            ]
        );
    }

    #[tokio::test]
    async fn backend_is_built_lazily_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let gateway = AgentGateway::new(options().await, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Recorder::default()) as Arc<dyn AgentBackend>)
        });

        assert!(!gateway.is_initialized());
        gateway.respond("a", &user()).await;
        gateway.respond("b", &user()).await;
        assert!(gateway.is_initialized());
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_initialisation_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let gateway = AgentGateway::new(options().await, move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AgentError::Init("no api key".into()))
            } else {
                Ok(Arc::new(Recorder::default()) as Arc<dyn AgentBackend>)
            }
        });

        assert!(gateway.initialize().await.is_err());
        assert!(!gateway.is_initialized());
        assert_eq!(gateway.respond("hi", &user()).await, "answer to hi");
        assert!(gateway.is_initialized());
    }
}
