//! Delayed job aggregate and its state machine.

use super::{ParseJobStatusError, SchedulerDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a delayed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a new random job identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a job identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Business key a job is scheduled under, e.g. an opportunity id.
///
/// At most one pending job exists per (key, name); a later enqueue for the
/// same pair supersedes the earlier job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobKey(String);

impl JobKey {
    /// Creates a validated job key.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerDomainError::EmptyJobKey`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, SchedulerDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(SchedulerDomainError::EmptyJobKey);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a job, identifying the handler that processes it.
///
/// The scheduler is name-agnostic; business modules define their own
/// names and register matching handlers at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    /// Creates a validated job name.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerDomainError::EmptyJobName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, SchedulerDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(SchedulerDomainError::EmptyJobName);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a delayed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to fire, or waiting for a retry after a handler failure.
    Pending,
    /// Handled successfully. Terminal.
    Fired,
    /// Superseded or cancelled before firing. Terminal.
    Cancelled,
}

impl JobStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fired => "fired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for statuses that accept no further change.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Fired | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "fired" => Ok(Self::Fired),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseJobStatusError(value.to_owned())),
        }
    }
}

/// One delayed job owned by the scheduler.
///
/// State machine: `Pending` to `Fired` (handled successfully) or
/// `Pending` to `Cancelled` (superseded or cancelled). A handler failure
/// leaves the job `Pending` with a later `fire_at`; jobs are never
/// silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedJob {
    id: JobId,
    key: JobKey,
    name: JobName,
    payload: Value,
    fire_at: DateTime<Utc>,
    status: JobStatus,
    attempts: u32,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedJobData {
    /// Persisted job identifier.
    pub id: JobId,
    /// Persisted business key.
    pub key: JobKey,
    /// Persisted job name.
    pub name: JobName,
    /// Persisted payload.
    pub payload: Value,
    /// Persisted fire time.
    pub fire_at: DateTime<Utc>,
    /// Persisted status.
    pub status: JobStatus,
    /// Persisted attempt count.
    pub attempts: u32,
    /// Persisted last handler error, if any.
    pub last_error: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl DelayedJob {
    /// Creates a pending job that fires at or after `fire_at`.
    #[must_use]
    pub fn new(
        key: JobKey,
        name: JobName,
        payload: Value,
        fire_at: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: JobId::new(),
            key,
            name,
            payload,
            fire_at,
            status: JobStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            key: data.key,
            name: data.name,
            payload: data.payload,
            fire_at: data.fire_at,
            status: data.status,
            attempts: data.attempts,
            last_error: data.last_error,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the business key.
    #[must_use]
    pub const fn key(&self) -> &JobKey {
        &self.key
    }

    /// Returns the job name.
    #[must_use]
    pub const fn name(&self) -> &JobName {
        &self.name
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the fire time.
    #[must_use]
    pub const fn fire_at(&self) -> DateTime<Utc> {
        self.fire_at
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the number of failed handler attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the last handler error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the job is pending and its fire time has
    /// elapsed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Pending && self.fire_at <= now
    }

    /// Marks the job handled successfully. Terminal.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerDomainError::AlreadySettled`] for fired or
    /// cancelled jobs.
    pub fn mark_fired(&mut self, clock: &impl Clock) -> Result<(), SchedulerDomainError> {
        self.ensure_pending()?;
        self.status = JobStatus::Fired;
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Cancels the job. Terminal.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerDomainError::AlreadySettled`] for fired or
    /// cancelled jobs; callers treating cancellation as best-effort check
    /// the status first.
    pub fn mark_cancelled(&mut self, clock: &impl Clock) -> Result<(), SchedulerDomainError> {
        self.ensure_pending()?;
        self.status = JobStatus::Cancelled;
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Records a failed handler attempt and reschedules the job.
    ///
    /// The job stays pending with `fire_at` pushed to `next_fire_at`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerDomainError::AlreadySettled`] for fired or
    /// cancelled jobs.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        next_fire_at: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), SchedulerDomainError> {
        self.ensure_pending()?;
        self.attempts += 1;
        self.last_error = Some(error.into());
        self.fire_at = next_fire_at;
        self.updated_at = clock.utc();
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), SchedulerDomainError> {
        if self.status.is_settled() {
            return Err(SchedulerDomainError::AlreadySettled {
                job_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}
