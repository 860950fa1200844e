//! The single seam between the gateway and the external agent framework.

use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, ModelIden};
use tracing::debug;

use crate::error::AgentError;
use crate::memory::{Turn, TurnRole};

/// Everything the backend needs for one call.
#[derive(Debug, Clone, Copy)]
pub struct AgentRequest<'a> {
    pub system_prompt: &'a str,
    pub history: &'a [Turn],
    pub query: &'a str,
}

/// A conversational backend that turns a prompt plus history into a reply.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn complete(&self, request: AgentRequest<'_>) -> Result<String, AgentError>;
}

/// Connection settings for [`GenaiBackend`].
#[derive(Debug, Clone)]
pub struct GenaiSettings {
    /// Model identifier, e.g. `"gemini-2.0-flash"`; genai infers the provider.
    pub model: String,
    /// API key for the provider. When `None`, genai's per-provider
    /// environment variables (`GEMINI_API_KEY`, ...) are used.
    pub api_key: Option<String>,
    pub temperature: f64,
}

/// [`AgentBackend`] backed by the `genai` multi-provider client.
pub struct GenaiBackend {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl GenaiBackend {
    pub fn new(settings: &GenaiSettings) -> Self {
        let mut builder = Client::builder();
        if let Some(key) = settings.api_key.clone() {
            let resolver = AuthResolver::from_resolver_fn(
                move |_model: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                    Ok(Some(AuthData::from_single(key.clone())))
                },
            );
            builder = builder.with_auth_resolver(resolver);
        }

        Self {
            client: builder.build(),
            model: settings.model.clone(),
            options: ChatOptions::default().with_temperature(settings.temperature),
        }
    }
}

#[async_trait]
impl AgentBackend for GenaiBackend {
    async fn complete(&self, request: AgentRequest<'_>) -> Result<String, AgentError> {
        let mut messages: Vec<ChatMessage> = request
            .history
            .iter()
            .map(|turn| match turn.role {
                TurnRole::User => ChatMessage::user(turn.content.clone()),
                TurnRole::Agent => ChatMessage::assistant(turn.content.clone()),
            })
            .collect();
        messages.push(ChatMessage::user(request.query.to_owned()));

        let chat_req = ChatRequest::new(messages).with_system(request.system_prompt.to_owned());

        debug!(model = %self.model, history = request.history.len(), "sending agent request");
        let response = self
            .client
            .exec_chat(self.model.as_str(), chat_req, Some(&self.options))
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        response
            .first_text()
            .map(str::to_owned)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AgentError::EmptyResponse)
    }
}
