//! Error types for the rehab_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rehab_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Password hashing or verification failed
    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Record store error (lock poisoned, dangling reference on insert, ...)
    #[error("Store error: {0}")]
    Store(String),

    /// A referenced record does not exist (or is not visible to the caller)
    #[error("{0} not found")]
    NotFound(String),

    /// The caller is authenticated but does not own the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A record with the same unique key already exists
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Input rejected before touching the store
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A multi-row write failed and was rolled back
    #[error("Internal error: {context}")]
    Internal {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification used by front ends to pick a status or exit code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Unauthorized,
    Invalid,
    Internal,
}

impl Error {
    /// Wrap a persistence failure, keeping the cause for diagnostics
    pub fn internal(context: impl Into<String>, source: Error) -> Self {
        Error::Internal {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::AlreadyExists(_)
            | Error::Validation(_)
            | Error::Config(_)
            | Error::Toml(_) => ErrorKind::Invalid,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_keeps_source() {
        let err = Error::internal(
            "failed to persist schedule",
            Error::Store("disk full".into()),
        );

        assert_eq!(err.kind(), ErrorKind::Internal);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Store error: disk full");
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::NotFound("Schedule".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Forbidden("x".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(Error::Unauthorized("x".into()).kind(), ErrorKind::Unauthorized);
        assert_eq!(Error::AlreadyExists("User".into()).kind(), ErrorKind::Invalid);
        assert_eq!(Error::Validation("x".into()).kind(), ErrorKind::Invalid);
    }

    #[test]
    fn test_not_found_message() {
        let err = Error::NotFound("Questionnaire".into());
        assert_eq!(err.to_string(), "Questionnaire not found");
    }
}
