//! Mapping of SQLite and pool failures onto the store's error taxonomy

use rusqlite::ErrorCode;
use tracing::warn;
use versakv_core::{BackendErrorKind, Deadline, Error};

/// Failure inside a backend round-trip
///
/// Keeps raw SQLite errors apart from store errors until the operation
/// finishes, so interrupts can be attributed to the operation's deadline.
#[derive(Debug)]
pub(crate) enum OpError {
    Sql(rusqlite::Error),
    Store(Error),
}

impl From<rusqlite::Error> for OpError {
    fn from(e: rusqlite::Error) -> Self {
        OpError::Sql(e)
    }
}

impl From<Error> for OpError {
    fn from(e: Error) -> Self {
        OpError::Store(e)
    }
}

impl OpError {
    /// Resolve into a store error
    pub(crate) fn resolve(self, operation: &'static str, deadline: &Deadline) -> Error {
        match self {
            OpError::Store(e) => e,
            OpError::Sql(e) => sql_error(e, operation, deadline),
        }
    }
}

/// Classify a SQLite error
///
/// An interrupted statement is reported as the timeout or cancellation that
/// triggered it.
pub(crate) fn sql_error(
    err: rusqlite::Error,
    operation: &'static str,
    deadline: &Deadline,
) -> Error {
    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::OperationInterrupted) => {
            let interrupted = deadline.check().err().unwrap_or_else(|| {
                Error::backend(BackendErrorKind::Cancelled, "statement interrupted")
            });
            warn!(target: "versakv::sqlite", operation, error = %interrupted, "Operation aborted");
            return interrupted;
        }
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            if let Err(expired) = deadline.check() {
                warn!(target: "versakv::sqlite", operation, error = %expired, "Lock wait aborted");
                return expired;
            }
            BackendErrorKind::Connection
        }
        Some(ErrorCode::CannotOpen | ErrorCode::SystemIoFailure | ErrorCode::NotADatabase) => {
            BackendErrorKind::Connection
        }
        Some(ErrorCode::ConstraintViolation) => BackendErrorKind::Constraint,
        _ => BackendErrorKind::Other,
    };
    Error::backend(kind, format!("{} failed: {}", operation, err))
}

/// Classify a pool checkout failure
pub(crate) fn pool_error(err: r2d2::Error, deadline: &Deadline) -> Error {
    if let Err(expired) = deadline.check() {
        warn!(target: "versakv::sqlite", error = %expired, "Connection checkout aborted");
        return expired;
    }
    Error::backend(
        BackendErrorKind::Connection,
        format!("connection pool checkout failed: {}", err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;
    use std::time::Duration;
    use versakv_core::CancellationToken;

    fn failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_is_retryable_connection_error() {
        let err = sql_error(failure(ffi::SQLITE_BUSY), "store", &Deadline::unbounded());
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Connection));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_busy_after_deadline_reports_timeout() {
        let deadline = Deadline::start(Some(Duration::ZERO), None);
        let err = sql_error(failure(ffi::SQLITE_BUSY), "store", &deadline);
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Timeout));
    }

    #[test]
    fn test_locked_after_cancellation_reports_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let deadline = Deadline::start(None, Some(token));
        let err = sql_error(failure(ffi::SQLITE_LOCKED), "store", &deadline);
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Cancelled));
    }

    #[test]
    fn test_constraint_violation() {
        let err = sql_error(failure(ffi::SQLITE_CONSTRAINT), "store", &Deadline::unbounded());
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Constraint));
        assert!(err.to_string().contains("store failed"));
    }

    #[test]
    fn test_interrupt_reports_timeout() {
        let deadline = Deadline::start(Some(Duration::ZERO), None);
        let err = sql_error(failure(ffi::SQLITE_INTERRUPT), "list_items", &deadline);
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Timeout));
    }

    #[test]
    fn test_interrupt_reports_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let deadline = Deadline::start(None, Some(token));
        let err = sql_error(failure(ffi::SQLITE_INTERRUPT), "store", &deadline);
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Cancelled));
    }

    #[test]
    fn test_store_errors_pass_through() {
        let err = OpError::from(Error::validation("bad")).resolve("store", &Deadline::unbounded());
        assert!(matches!(err, Error::Validation(_)));
    }
}
