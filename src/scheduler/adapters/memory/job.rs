//! In-memory job store for scheduler tests and reference semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::scheduler::{
    domain::{DelayedJob, JobId, JobKey, JobName, JobStatus},
    ports::{JobStore, JobStoreError, JobStoreResult},
};

/// Thread-safe in-memory job store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    state: Arc<RwLock<InMemoryJobState>>,
}

#[derive(Debug, Default)]
struct InMemoryJobState {
    jobs: HashMap<JobId, DelayedJob>,
    insertion: HashMap<JobId, u64>,
    next_seq: u64,
}

impl InMemoryJobStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> JobStoreError {
    JobStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: &DelayedJob) -> JobStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.jobs.contains_key(&job.id()) {
            return Err(JobStoreError::DuplicateJob(job.id()));
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.insertion.insert(job.id(), seq);
        state.jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn update(&self, job: &DelayedJob) -> JobStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.jobs.contains_key(&job.id()) {
            return Err(JobStoreError::NotFound(job.id()));
        }
        state.jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> JobStoreResult<Option<DelayedJob>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.jobs.get(&id).cloned())
    }

    async fn find_pending(
        &self,
        key: &JobKey,
        name: &JobName,
    ) -> JobStoreResult<Option<DelayedJob>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .jobs
            .values()
            .find(|job| {
                job.status() == JobStatus::Pending && job.key() == key && job.name() == name
            })
            .cloned())
    }

    async fn due(&self, now: DateTime<Utc>) -> JobStoreResult<Vec<DelayedJob>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut due: Vec<DelayedJob> = state
            .jobs
            .values()
            .filter(|job| job.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|job| {
            (
                job.fire_at(),
                state.insertion.get(&job.id()).copied().unwrap_or(u64::MAX),
            )
        });
        Ok(due)
    }
}
