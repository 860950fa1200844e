//! Conversational agent gateway for supplychat.
//!
//! The agent framework is an external collaborator reached through the
//! [`AgentBackend`] trait. [`AgentGateway`] adds what the server relies on:
//! per-call system prompt rendering, bounded per-user memory, a call
//! deadline, and the guarantee that [`AgentGateway::respond`] always yields
//! text.

mod backend;
mod error;
mod gateway;
mod memory;
mod prompt;

pub use backend::{AgentBackend, AgentRequest, GenaiBackend, GenaiSettings};
pub use error::AgentError;
pub use gateway::{apology, AgentGateway, BackendFactory, GatewayOptions};
pub use memory::{ConversationMemory, Turn, TurnRole};
pub use prompt::{PromptSource, PromptTemplate, SystemPrompt, DEFAULT_SYSTEM_PROMPT};

/// The caller facts substituted into the system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub username: String,
    pub role: String,
    pub location: Option<String>,
}
