//! Error types for the conversational interface.

use lexicon_client::{CatalogError, LlmError};
use lexicon_core::error::LexiconError;

/// Errors from the chat shell. These reject a message before routing.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<LexiconError> for ChatError {
    fn from(err: LexiconError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}

/// Degradations recorded while routing a turn. None of these is fatal:
/// each one is recovered locally and annotated on the outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("not found in catalog: {0}")]
    CatalogNotFound(String),
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),
    #[error("could not resolve intent for '{0}'")]
    IntentUnresolved(String),
}

impl From<CatalogError> for RouteError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unauthorized(reason) => {
                RouteError::CatalogUnavailable(format!("unauthorized ({})", reason))
            }
            CatalogError::ServiceUnavailable(reason) => RouteError::CatalogUnavailable(reason),
            CatalogError::NotFound(subject) => RouteError::CatalogNotFound(subject),
        }
    }
}

impl From<LlmError> for RouteError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unavailable(reason) => RouteError::LlmUnavailable(reason),
        }
    }
}
