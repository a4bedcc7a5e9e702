//! Error types for versakv
//!
//! Every public operation returns [`Result`]. Errors are never recovered or
//! retried inside the store; [`Error::is_retryable`] tells callers whether a
//! retry might succeed.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::fmt;
use thiserror::Error;

/// Result type alias for versakv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of backend failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Backend unreachable, busy or locked, or pool exhausted
    Connection,
    /// A schema constraint rejected the write
    Constraint,
    /// The operation deadline expired
    Timeout,
    /// The caller cancelled the operation
    Cancelled,
    /// No further item ids can be allocated
    Exhausted,
    /// Anything else reported by the backend
    Other,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendErrorKind::Connection => "connection",
            BackendErrorKind::Constraint => "constraint",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Cancelled => "cancelled",
            BackendErrorKind::Exhausted => "exhausted",
            BackendErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Error types for the versioned item store
#[derive(Debug, Error)]
pub enum Error {
    /// Namespace, key, cursor or content rejected before touching the backend
    #[error("Validation error: {0}")]
    Validation(String),

    /// Content could not be encoded, or a stored record could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Storage engine failure
    #[error("Backend error ({kind}): {message}")]
    Backend {
        /// Failure class
        kind: BackendErrorKind,
        /// Backend-provided detail
        message: String,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create a backend error of the given kind
    pub fn backend(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Error::Backend {
            kind,
            message: message.into(),
        }
    }

    /// Backend failure class, if this is a backend error
    pub fn backend_kind(&self) -> Option<BackendErrorKind> {
        match self {
            Error::Backend { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether retrying the same operation might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.backend_kind(),
            Some(BackendErrorKind::Connection | BackendErrorKind::Timeout)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let err = Error::validation("namespace must not be empty");
        let msg = err.to_string();
        assert!(msg.contains("Validation error"));
        assert!(msg.contains("namespace must not be empty"));
    }

    #[test]
    fn test_error_display_backend() {
        let err = Error::backend(BackendErrorKind::Timeout, "deadline of 5ms expired");
        let msg = err.to_string();
        assert!(msg.contains("Backend error (timeout)"));
        assert!(msg.contains("5ms"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let result: Result<serde_json::Value> =
            serde_json::from_str("{not json").map_err(Error::from);
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::backend(BackendErrorKind::Connection, "busy").is_retryable());
        assert!(Error::backend(BackendErrorKind::Timeout, "slow").is_retryable());
        assert!(!Error::backend(BackendErrorKind::Cancelled, "stop").is_retryable());
        assert!(!Error::backend(BackendErrorKind::Constraint, "dup").is_retryable());
        assert!(!Error::Encoding("bad".into()).is_retryable());
        assert!(!Error::validation("empty").is_retryable());
    }

    #[test]
    fn test_backend_kind_accessor() {
        let err = Error::backend(BackendErrorKind::Exhausted, "ids");
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Exhausted));
        assert_eq!(Error::validation("x").backend_kind(), None);
    }
}
