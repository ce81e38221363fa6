//! Observer port for committed stage transitions.

use crate::pipeline::domain::StageTransition;
use async_trait::async_trait;
use thiserror::Error;

/// Error returned by a transition observer.
///
/// Observer failures are logged by the pipeline and never roll back the
/// committed transition; recovery happens through the observer's own
/// reconciliation (for the trial coordinator, the scheduler retry loop).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transition observer failed: {message}")]
pub struct ObserverError {
    message: String,
}

impl ObserverError {
    /// Creates an observer error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Subscriber notified after each committed stage transition.
///
/// Notification is at-least-once: an observer may see the same transition
/// more than once and must be idempotent.
#[async_trait]
pub trait TransitionObserver: Send + Sync {
    /// Reacts to one committed stage transition.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError`] when the reaction fails; the pipeline
    /// logs the failure and continues.
    async fn on_transition(&self, transition: &StageTransition) -> Result<(), ObserverError>;
}
