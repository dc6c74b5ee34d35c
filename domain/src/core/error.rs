//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid history backend: {0}")]
    InvalidHistoryBackend(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl DomainError {
    /// Check if this error is fatal for startup (configuration-derived)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DomainError::UnsupportedProvider(_)
                | DomainError::InvalidHistoryBackend(_)
                | DomainError::InvalidModel(_)
        )
    }
}
