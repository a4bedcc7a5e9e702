//! Cooperative cancellation and deadlines
//!
//! A [`Deadline`] bundles the optional timeout and cancellation token that
//! govern one store operation. Backends poll [`Deadline::check`] while the
//! operation is in flight and abort with the returned error.

use crate::error::{BackendErrorKind, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag that aborts in-flight operations once set
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not yet cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every operation observing this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Time and cancellation budget of a single operation
#[derive(Debug, Clone)]
pub struct Deadline {
    expires_at: Option<Instant>,
    timeout: Option<Duration>,
    token: Option<CancellationToken>,
}

impl Deadline {
    /// Start the clock for an operation
    pub fn start(timeout: Option<Duration>, token: Option<CancellationToken>) -> Self {
        Deadline {
            expires_at: timeout.map(|t| Instant::now() + t),
            timeout,
            token,
        }
    }

    /// A deadline that never fires
    pub fn unbounded() -> Self {
        Deadline::start(None, None)
    }

    /// Whether a timeout or cancellation token governs this operation
    pub fn is_bounded(&self) -> bool {
        self.expires_at.is_some() || self.token.is_some()
    }

    /// Time left before expiry, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Whether the operation must stop now
    pub fn is_over(&self) -> bool {
        self.token.as_ref().map_or(false, |t| t.is_cancelled())
            || self.expires_at.map_or(false, |at| Instant::now() >= at)
    }

    /// Fail if the operation was cancelled or ran out of time
    pub fn check(&self) -> Result<()> {
        if self.token.as_ref().map_or(false, |t| t.is_cancelled()) {
            return Err(Error::backend(
                BackendErrorKind::Cancelled,
                "operation cancelled by caller",
            ));
        }
        if let (Some(at), Some(timeout)) = (self.expires_at, self.timeout) {
            if Instant::now() >= at {
                return Err(Error::backend(
                    BackendErrorKind::Timeout,
                    format!("operation exceeded timeout of {:?}", timeout),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_fires() {
        let deadline = Deadline::unbounded();
        assert!(!deadline.is_over());
        assert!(deadline.check().is_ok());
        assert!(!deadline.is_bounded());
        assert_eq!(deadline.remaining(), None);
    }

    #[test]
    fn test_zero_timeout_fires_immediately() {
        let deadline = Deadline::start(Some(Duration::ZERO), None);
        assert!(deadline.is_over());
        let err = deadline.check().unwrap_err();
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Timeout));
    }

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let deadline = Deadline::start(Some(Duration::from_secs(60)), Some(token.clone()));
        assert!(deadline.check().is_ok());

        token.cancel();
        assert!(deadline.is_over());
        let err = deadline.check().unwrap_err();
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Cancelled));
    }
}
