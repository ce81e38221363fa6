//! Coordinator reacting to pipeline transitions with scheduling intents.

use super::{
    ReminderNotifier, TRIAL_END_JOB, TRIAL_REMINDER_JOB, TRIAL_REMINDER_LEAD_DAYS,
    handlers::{TrialEndHandler, TrialReminderHandler},
};
use crate::pipeline::{
    domain::{OpportunityId, Stage, StageTransition},
    ports::{ObserverError, OpportunityRepository, TransitionObserver},
    services::OpportunityPipeline,
};
use crate::scheduler::{
    domain::{JobKey, JobName, SchedulerDomainError},
    ports::JobStore,
    services::DelayedJobScheduler,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Payload carried by both trial jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialJobPayload {
    /// Opportunity whose trial the job concerns.
    pub opportunity_id: OpportunityId,
    /// Trial window end captured when the job was scheduled.
    pub trial_ends_at: DateTime<Utc>,
}

/// Subscriber translating trial stage changes into scheduling intents.
///
/// Leaving `Trial` cancels the old window's jobs before anything else, so
/// re-entering `Trial` with a fresh date (a window renewal) first clears
/// the stale jobs and then enqueues new ones. Notification is
/// at-least-once; every enqueue supersedes and every cancel tolerates
/// absence, so duplicates are harmless.
pub struct TrialExpiryCoordinator<S, C>
where
    S: JobStore,
    C: Clock + Send + Sync,
{
    scheduler: Arc<DelayedJobScheduler<S, C>>,
}

impl<S, C> TrialExpiryCoordinator<S, C>
where
    S: JobStore,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator over the given scheduler.
    #[must_use]
    pub const fn new(scheduler: Arc<DelayedJobScheduler<S, C>>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl<S, C> TransitionObserver for TrialExpiryCoordinator<S, C>
where
    S: JobStore,
    C: Clock + Send + Sync,
{
    async fn on_transition(&self, transition: &StageTransition) -> Result<(), ObserverError> {
        let key = JobKey::new(transition.opportunity_id.to_string()).map_err(observer_error)?;
        let reminder = JobName::new(TRIAL_REMINDER_JOB).map_err(observer_error)?;
        let expiry = JobName::new(TRIAL_END_JOB).map_err(observer_error)?;

        if transition.from_stage == Stage::Trial {
            self.scheduler
                .cancel(&key, &reminder)
                .await
                .map_err(observer_error)?;
            self.scheduler
                .cancel(&key, &expiry)
                .await
                .map_err(observer_error)?;
        }

        if transition.to_stage == Stage::Trial {
            let Some(trial_ends_at) = transition.trial_ends_at else {
                warn!(
                    opportunity_id = %transition.opportunity_id,
                    "trial entered without a window; no expiry jobs scheduled"
                );
                return Ok(());
            };
            let payload = serde_json::to_value(TrialJobPayload {
                opportunity_id: transition.opportunity_id,
                trial_ends_at,
            })
            .map_err(observer_error)?;

            self.scheduler
                .enqueue(
                    key.clone(),
                    reminder,
                    payload.clone(),
                    trial_ends_at - Duration::days(TRIAL_REMINDER_LEAD_DAYS),
                )
                .await
                .map_err(observer_error)?;
            self.scheduler
                .enqueue(key, expiry, payload, trial_ends_at)
                .await
                .map_err(observer_error)?;
        }

        Ok(())
    }
}

/// Wires trial expiry coordination into a pipeline and a scheduler.
///
/// Registers the coordinator as a transition observer and both trial job
/// handlers; call once at startup, before traffic arrives.
///
/// # Errors
///
/// Returns [`SchedulerDomainError`] when a job name constant fails
/// validation, which indicates a build misconfiguration.
pub fn install<R, C, S, N>(
    pipeline: &Arc<OpportunityPipeline<R, C>>,
    scheduler: &Arc<DelayedJobScheduler<S, C>>,
    notifier: Arc<N>,
) -> Result<(), SchedulerDomainError>
where
    R: OpportunityRepository + 'static,
    C: Clock + Send + Sync + 'static,
    S: JobStore + 'static,
    N: ReminderNotifier + 'static,
{
    let coordinator = TrialExpiryCoordinator::new(Arc::clone(scheduler));
    pipeline.register_observer(Arc::new(coordinator));
    scheduler.register_handler(
        JobName::new(TRIAL_END_JOB)?,
        Arc::new(TrialEndHandler::new(Arc::clone(pipeline))),
    );
    scheduler.register_handler(
        JobName::new(TRIAL_REMINDER_JOB)?,
        Arc::new(TrialReminderHandler::new(notifier)),
    );
    Ok(())
}

fn observer_error(err: impl std::fmt::Display) -> ObserverError {
    ObserverError::new(err.to_string())
}
