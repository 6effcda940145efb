//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Only deterministic input failures live here. Storage failures are reported by
/// the infrastructure layer with their own type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was absent from the payload.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field was present but had the wrong type or an out-of-range value.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was absent or could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn missing(field: &'static str) -> Self {
        Self::MissingField(field)
    }
}
