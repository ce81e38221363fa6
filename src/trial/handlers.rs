//! Handlers for the trial expiry jobs.

use super::{ReminderNotifier, TrialJobPayload};
use crate::identity::ActorId;
use crate::pipeline::{
    domain::{PipelineDomainError, Stage},
    ports::OpportunityRepository,
    services::{OpportunityPipeline, PipelineServiceError, TransitionRequest},
};
use crate::scheduler::{
    domain::DelayedJob,
    ports::{JobHandler, JobHandlerError},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parses the trial payload, treating malformed payloads as permanently
/// unprocessable: they are logged and dropped rather than retried forever.
fn parse_payload(job: &DelayedJob) -> Option<TrialJobPayload> {
    match serde_json::from_value(job.payload().clone()) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(
                job_id = %job.id(),
                name = %job.name(),
                error = %err,
                "trial job payload is malformed; dropping the firing"
            );
            None
        }
    }
}

/// Handler for the trial expiry job.
///
/// Re-reads the opportunity and applies the `TrialExpiring` transition as
/// the system actor. Stale firings (the opportunity left `Trial` in the
/// meantime) and duplicate firings are no-ops; a lost optimistic-lock
/// race surfaces as a retryable failure.
pub struct TrialEndHandler<R, C>
where
    R: OpportunityRepository,
    C: Clock + Send + Sync,
{
    pipeline: Arc<OpportunityPipeline<R, C>>,
}

impl<R, C> TrialEndHandler<R, C>
where
    R: OpportunityRepository,
    C: Clock + Send + Sync,
{
    /// Creates the handler over the given pipeline.
    #[must_use]
    pub const fn new(pipeline: Arc<OpportunityPipeline<R, C>>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl<R, C> JobHandler for TrialEndHandler<R, C>
where
    R: OpportunityRepository,
    C: Clock + Send + Sync,
{
    async fn handle(&self, job: &DelayedJob) -> Result<(), JobHandlerError> {
        let Some(payload) = parse_payload(job) else {
            return Ok(());
        };

        let opportunity = match self.pipeline.get(payload.opportunity_id).await {
            Ok(opportunity) => opportunity,
            Err(PipelineServiceError::NotFound(_)) => {
                debug!(
                    opportunity_id = %payload.opportunity_id,
                    "opportunity gone; trial expiry is a no-op"
                );
                return Ok(());
            }
            Err(err) => return Err(JobHandlerError::from_source(&err)),
        };
        if opportunity.stage() != Stage::Trial {
            debug!(
                opportunity_id = %payload.opportunity_id,
                stage = %opportunity.stage(),
                "opportunity no longer in trial; expiry firing is a no-op"
            );
            return Ok(());
        }

        let request = TransitionRequest::new(
            payload.opportunity_id,
            Stage::TrialExpiring,
            ActorId::system(),
        );
        match self.pipeline.transition(request).await {
            Ok(_) => Ok(()),
            // Closed between the re-check and the commit; nothing to expire.
            Err(PipelineServiceError::Domain(PipelineDomainError::TerminalStage { .. })) => Ok(()),
            Err(err) => Err(JobHandlerError::from_source(&err)),
        }
    }
}

/// Handler for the trial reminder job.
///
/// Dispatch is fire-and-forget: notifier failures are logged and never
/// fail the firing, so a broken notification channel cannot wedge the
/// scheduler.
pub struct TrialReminderHandler<N>
where
    N: ReminderNotifier,
{
    notifier: Arc<N>,
}

impl<N> TrialReminderHandler<N>
where
    N: ReminderNotifier,
{
    /// Creates the handler over the given notifier.
    #[must_use]
    pub const fn new(notifier: Arc<N>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl<N> JobHandler for TrialReminderHandler<N>
where
    N: ReminderNotifier,
{
    async fn handle(&self, job: &DelayedJob) -> Result<(), JobHandlerError> {
        let Some(payload) = parse_payload(job) else {
            return Ok(());
        };
        if let Err(err) = self
            .notifier
            .trial_expiring_soon(payload.opportunity_id, payload.trial_ends_at)
            .await
        {
            warn!(
                opportunity_id = %payload.opportunity_id,
                error = %err,
                "trial reminder notification failed"
            );
        }
        Ok(())
    }
}
