//! Store port for delayed job persistence.

use crate::scheduler::domain::{DelayedJob, JobId, JobKey, JobName};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for job store operations.
pub type JobStoreResult<T> = Result<T, JobStoreError>;

/// Delayed job persistence contract.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Stores a new job.
    ///
    /// # Errors
    ///
    /// Returns [`JobStoreError::DuplicateJob`] when the identifier already
    /// exists.
    async fn insert(&self, job: &DelayedJob) -> JobStoreResult<()>;

    /// Persists a job's state change.
    ///
    /// # Errors
    ///
    /// Returns [`JobStoreError::NotFound`] when the job does not exist.
    async fn update(&self, job: &DelayedJob) -> JobStoreResult<()>;

    /// Finds a job by identifier.
    ///
    /// Returns `None` when the job does not exist.
    async fn find_by_id(&self, id: JobId) -> JobStoreResult<Option<DelayedJob>>;

    /// Finds the pending job for a (key, name) pair, if any.
    ///
    /// At most one pending job exists per pair; enqueue supersedes.
    async fn find_pending(
        &self,
        key: &JobKey,
        name: &JobName,
    ) -> JobStoreResult<Option<DelayedJob>>;

    /// Lists pending jobs whose fire time has elapsed, ordered by fire
    /// time, ties broken by insertion sequence.
    async fn due(&self, now: DateTime<Utc>) -> JobStoreResult<Vec<DelayedJob>>;
}

/// Errors returned by job store implementations.
#[derive(Debug, Clone, Error)]
pub enum JobStoreError {
    /// A job with the same identifier already exists.
    #[error("duplicate job identifier: {0}")]
    DuplicateJob(JobId),

    /// The job was not found.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl JobStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for JobStoreError {
    fn from(err: diesel::result::Error) -> Self {
        // All Diesel errors surface as persistence errors; adapters map
        // unique violations and missing rows to semantic variants before
        // this conversion applies.
        Self::persistence(err)
    }
}
