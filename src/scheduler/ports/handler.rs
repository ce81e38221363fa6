//! Handler port for delayed job processing.

use crate::scheduler::domain::DelayedJob;
use async_trait::async_trait;
use thiserror::Error;

/// Error returned by a job handler.
///
/// A failed attempt leaves the job pending; the scheduler retries it with
/// backoff. Handlers signal permanent irrelevance (a stale job) by
/// returning `Ok` instead of an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("job handler failed: {message}")]
pub struct JobHandlerError {
    message: String,
}

impl JobHandlerError {
    /// Creates a handler error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a handler error from a source error.
    #[must_use]
    pub fn from_source(err: &(impl std::error::Error + ?Sized)) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Processor for one named class of delayed jobs.
///
/// Delivery is at-least-once: the same firing may be delivered more than
/// once (after a crash, a restart, or a lost acknowledgement), so
/// handlers must re-validate state and be idempotent.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Handles one due job.
    ///
    /// # Errors
    ///
    /// Returns [`JobHandlerError`] when the attempt failed and should be
    /// retried later.
    async fn handle(&self, job: &DelayedJob) -> Result<(), JobHandlerError>;
}
