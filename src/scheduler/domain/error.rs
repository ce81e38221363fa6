//! Error types for scheduler domain validation and parsing.

use super::{JobId, JobStatus};
use thiserror::Error;

/// Errors returned while validating delayed jobs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerDomainError {
    /// The job key is empty after trimming.
    #[error("job key must not be empty")]
    EmptyJobKey,

    /// The job name is empty after trimming.
    #[error("job name must not be empty")]
    EmptyJobName,

    /// The job is already fired or cancelled and accepts no state change.
    #[error("job {job_id} is already {status} and cannot change")]
    AlreadySettled {
        /// Job being mutated.
        job_id: JobId,
        /// Terminal status the job currently holds.
        status: JobStatus,
    },
}

/// Error returned while parsing job statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(pub String);
