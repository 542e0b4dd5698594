//! Error types shared across the request-handling core.
//!
//! # Design Decisions
//! - Expected outcomes (admission rejection, routing miss) are responses, not errors
//! - Faults raised inside the chain are converted to 500 responses at the executor boundary
//! - Nothing below the executor escapes to the transport as a process fault

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Misuse of a request context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The response was already flushed; writer operations are no longer allowed.
    #[error("response already finished")]
    ResponseFinished,

    /// A frozen setting was written twice.
    #[error("frozen setting `{0}` cannot be overwritten")]
    FrozenKey(String),

    /// Header name or value rejected by the HTTP layer.
    #[error("invalid header `{0}`")]
    InvalidHeader(String),
}

/// Serialization failure while producing a response body.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml encoding failed: {0}")]
    Xml(String),
}

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by an application middleware or handler.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl Error {
    /// Build a handler failure from any displayable message.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
