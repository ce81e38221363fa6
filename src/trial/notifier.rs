//! Outbound reminder notification port.

use crate::pipeline::domain::OpportunityId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Error returned by a reminder notifier.
///
/// Notification is fire-and-forget: failures are logged by the reminder
/// handler and never block the scheduler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("reminder notification failed: {message}")]
pub struct ReminderNotifierError {
    message: String,
}

impl ReminderNotifierError {
    /// Creates a notifier error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Dispatch port for trial expiry reminders.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    /// Notifies the owning seller that a trial is expiring soon.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderNotifierError`] when dispatch fails.
    async fn trial_expiring_soon(
        &self,
        opportunity_id: OpportunityId,
        trial_ends_at: DateTime<Utc>,
    ) -> Result<(), ReminderNotifierError>;
}

/// In-memory notifier recording every reminder, for tests.
#[derive(Debug, Default)]
pub struct RecordingReminderNotifier {
    sent: Mutex<Vec<(OpportunityId, DateTime<Utc>)>>,
}

impl RecordingReminderNotifier {
    /// Creates an empty recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reminders sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(OpportunityId, DateTime<Utc>)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ReminderNotifier for RecordingReminderNotifier {
    async fn trial_expiring_soon(
        &self,
        opportunity_id: OpportunityId,
        trial_ends_at: DateTime<Utc>,
    ) -> Result<(), ReminderNotifierError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((opportunity_id, trial_ends_at));
        Ok(())
    }
}
