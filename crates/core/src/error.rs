// Central Error Type for the Application

use thiserror::Error;

/// Application-level error taxonomy.
///
/// Every failure surfaced by the engine maps to exactly one variant:
/// missed lookups are `NotFound`, transition violations are `InvalidState`,
/// malformed caller input is `InvalidArgument`, and storage failures are
/// `Unavailable`. Nothing is retried internally; retry policy belongs to
/// the caller.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<crate::domain::DomainError> for AppError {
    fn from(err: crate::domain::DomainError) -> Self {
        use crate::domain::DomainError;
        match err {
            DomainError::InvalidStateTransition { .. } => AppError::InvalidState(err.to_string()),
            DomainError::ValidationError(msg) => AppError::InvalidArgument(msg),
        }
    }
}
