//! Service layer for delayed job scheduling and dispatch.

use crate::scheduler::{
    domain::{DelayedJob, JobId, JobKey, JobName, JobStatus, SchedulerDomainError},
    ports::{JobHandler, JobStore, JobStoreError},
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// First retry delay after a handler failure.
const BASE_RETRY_SECONDS: i64 = 30;

/// Upper bound on the retry delay.
const MAX_RETRY_SECONDS: i64 = 3_600;

/// Reference to one enqueued job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Identifier of the enqueued job.
    pub id: JobId,
    /// Business key the job is scheduled under.
    pub key: JobKey,
    /// Job name.
    pub name: JobName,
    /// Time the job fires at or after.
    pub fire_at: DateTime<Utc>,
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Jobs handled successfully and marked fired.
    pub fired: usize,
    /// Jobs whose handler failed; they stay pending with backoff.
    pub failed: usize,
    /// Due jobs skipped: settled in the meantime, or no handler
    /// registered.
    pub skipped: usize,
}

/// Service-level errors for scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] SchedulerDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Result type for scheduler service operations.
pub type SchedulerServiceResult<T> = Result<T, SchedulerServiceError>;

/// Generic at-least-once delayed-job scheduler.
///
/// Jobs are enqueued under a (key, name) pair with supersede semantics
/// and dispatched by [`run_once`](Self::run_once), either driven directly
/// (deterministic tests, external reconciliation) or by the polling loop
/// in [`run`](Self::run). Firings of the same pair never run concurrently;
/// a per-key mutex serialises them and the job status is re-checked under
/// the lock, because cancellation of a job already mid-firing is
/// best-effort.
pub struct DelayedJobScheduler<S, C>
where
    S: JobStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    handlers: RwLock<HashMap<JobName, Arc<dyn JobHandler>>>,
    firing_locks: Mutex<HashMap<(JobKey, JobName), Arc<Mutex<()>>>>,
}

impl<S, C> DelayedJobScheduler<S, C>
where
    S: JobStore,
    C: Clock + Send + Sync,
{
    /// Creates a new scheduler over the given store.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            handlers: RwLock::new(HashMap::new()),
            firing_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Registers the handler for one job name.
    ///
    /// Registration happens once at startup; registering the same name
    /// again replaces the earlier handler.
    pub fn register_handler(&self, name: JobName, handler: Arc<dyn JobHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, handler);
    }

    /// Enqueues a job, superseding any pending job for the same
    /// (key, name) pair so the latest scheduling intent wins.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerServiceError`] when the store rejects the write.
    pub async fn enqueue(
        &self,
        key: JobKey,
        name: JobName,
        payload: Value,
        fire_at: DateTime<Utc>,
    ) -> SchedulerServiceResult<JobHandle> {
        if let Some(mut superseded) = self.store.find_pending(&key, &name).await? {
            superseded.mark_cancelled(&*self.clock)?;
            self.store.update(&superseded).await?;
            debug!(key = %key, name = %name, "superseded earlier pending job");
        }

        let job = DelayedJob::new(key, name, payload, fire_at, &*self.clock);
        self.store.insert(&job).await?;
        Ok(JobHandle {
            id: job.id(),
            key: job.key().clone(),
            name: job.name().clone(),
            fire_at: job.fire_at(),
        })
    }

    /// Cancels the pending job for a (key, name) pair; a no-op when none
    /// exists. Jobs already fired or cancelled are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerServiceError`] when the store rejects the write.
    pub async fn cancel(&self, key: &JobKey, name: &JobName) -> SchedulerServiceResult<()> {
        if let Some(mut pending) = self.store.find_pending(key, name).await? {
            pending.mark_cancelled(&*self.clock)?;
            self.store.update(&pending).await?;
            debug!(key = %key, name = %name, "cancelled pending job");
        }
        Ok(())
    }

    /// Runs one dispatch pass over the jobs due at `now`.
    ///
    /// Each due job is re-read under its firing lock; settled jobs are
    /// skipped, handler successes mark the job fired, and handler
    /// failures leave it pending with an exponential-backoff fire time.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerServiceError`] when the store fails; individual
    /// handler failures are absorbed into the report.
    pub async fn run_once(&self, now: DateTime<Utc>) -> SchedulerServiceResult<DispatchReport> {
        let due = self.store.due(now).await?;
        let mut report = DispatchReport::default();

        for job in due {
            let lock = self.firing_lock(job.key(), job.name()).await;
            let _guard = lock.lock().await;

            let Some(mut fresh) = self.store.find_by_id(job.id()).await? else {
                report.skipped += 1;
                continue;
            };
            if fresh.status() != JobStatus::Pending {
                report.skipped += 1;
                continue;
            }
            let Some(handler) = self.handler_for(fresh.name()) else {
                warn!(name = %fresh.name(), key = %fresh.key(), "no handler registered for due job");
                report.skipped += 1;
                continue;
            };

            match handler.handle(&fresh).await {
                Ok(()) => {
                    fresh.mark_fired(&*self.clock)?;
                    self.store.update(&fresh).await?;
                    report.fired += 1;
                    debug!(name = %fresh.name(), key = %fresh.key(), "delayed job fired");
                }
                Err(err) => {
                    let next_fire_at = now + retry_delay(fresh.attempts());
                    fresh.record_failure(err.to_string(), next_fire_at, &*self.clock)?;
                    self.store.update(&fresh).await?;
                    report.failed += 1;
                    warn!(
                        name = %fresh.name(),
                        key = %fresh.key(),
                        attempts = fresh.attempts(),
                        error = %err,
                        "delayed job handler failed; job stays pending"
                    );
                }
            }
        }
        Ok(report)
    }

    /// Runs the background dispatch loop.
    ///
    /// Callers spawn this on their runtime; dispatch errors are logged
    /// and the loop continues with the next tick.
    pub async fn run(self: Arc<Self>, poll_interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = self.clock.utc();
            if let Err(err) = self.run_once(now).await {
                error!(error = %err, "delayed job dispatch pass failed");
            }
        }
    }

    fn handler_for(&self, name: &JobName) -> Option<Arc<dyn JobHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    async fn firing_lock(&self, key: &JobKey, name: &JobName) -> Arc<Mutex<()>> {
        let mut locks = self.firing_locks.lock().await;
        locks
            .entry((key.clone(), name.clone()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Exponential backoff for failed handler attempts, capped at one hour.
fn retry_delay(attempts: u32) -> Duration {
    let shift = attempts.min(7);
    let seconds = BASE_RETRY_SECONDS.saturating_mul(1_i64 << shift);
    Duration::seconds(seconds.min(MAX_RETRY_SECONDS))
}
