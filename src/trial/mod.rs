//! Trial expiry coordination for Dealflow.
//!
//! Stateless glue between the opportunity pipeline and the delayed-job
//! scheduler: entering `Trial` schedules a reminder five days before the
//! window closes and an expiry job at the close; leaving `Trial` cancels
//! both. The expiry handler re-checks the opportunity before acting, so
//! duplicate or stale firings are harmless, and the reminder handler
//! reaches the outside world only through the [`ReminderNotifier`] port.

mod coordinator;
mod handlers;
mod notifier;

pub use coordinator::{TrialExpiryCoordinator, TrialJobPayload, install};
pub use handlers::{TrialEndHandler, TrialReminderHandler};
pub use notifier::{RecordingReminderNotifier, ReminderNotifier, ReminderNotifierError};

/// Job name for the reminder fired five days before the trial ends.
pub const TRIAL_REMINDER_JOB: &str = "trial-dminus5";

/// Job name for the expiry job fired when the trial ends.
pub const TRIAL_END_JOB: &str = "trial-end";

/// Days before the trial end at which the reminder fires.
pub const TRIAL_REMINDER_LEAD_DAYS: i64 = 5;

#[cfg(test)]
mod tests;
