use std::time::Duration;

use thiserror::Error;

/// Errors raised inside the agent gateway.
///
/// None of these reach HTTP callers: [`crate::AgentGateway::respond`] turns
/// every one of them into an apology reply.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The backend could not be constructed.
    #[error("agent initialisation failed: {0}")]
    Init(String),

    /// The backend accepted the request but the call failed.
    #[error("agent backend error: {0}")]
    Backend(String),

    /// The backend did not answer within the configured deadline.
    #[error("agent call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered without any text content.
    #[error("agent returned an empty response")]
    EmptyResponse,
}
