//! Error types for the catalog and LLM collaborators.

/// Failures from the data-catalog service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog rejected credentials: {0}")]
    Unauthorized(String),
    #[error("catalog unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("not found in catalog: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::ServiceUnavailable(format!("request timed out: {}", err))
        } else {
            CatalogError::ServiceUnavailable(err.to_string())
        }
    }
}

/// Failures from the language-model endpoint. There is a single sentinel:
/// the caller only ever needs to know the LLM could not help this turn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Unavailable(err.to_string())
    }
}
