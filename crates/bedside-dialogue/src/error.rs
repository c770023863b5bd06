use thiserror::Error;

use bedside_core::error::BedsideError;

/// Errors produced by the conversation engine.
///
/// Authorization never appears here: the API layer resolves the identity
/// before the orchestrator runs and hands it a verified username.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Session cache error: {0}")]
    Cache(String),

    #[error("Dialogue history is empty")]
    EmptyHistory,

    #[error("Message too long: {0} characters (max {max})", max = crate::orchestrator::MAX_MESSAGE_LEN)]
    MessageTooLong(usize),
}

impl From<BedsideError> for DialogueError {
    fn from(err: BedsideError) -> Self {
        match err {
            BedsideError::Generation(msg) => DialogueError::Generation(msg),
            other => DialogueError::Cache(other.to_string()),
        }
    }
}

impl From<DialogueError> for BedsideError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::Generation(msg) => BedsideError::Generation(msg),
            DialogueError::Cache(msg) => BedsideError::Storage(msg),
            other => BedsideError::Api(other.to_string()),
        }
    }
}
