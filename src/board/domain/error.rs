//! Error types for board domain validation and parsing.

use super::{TaskId, TaskStatus};
use crate::identity::EmptyActorId;
use thiserror::Error;

/// Errors returned while validating implementation task state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The task is in a terminal status and accepts no status change.
    #[error("task {task_id} is in terminal status {status} and cannot change")]
    TerminalStatus {
        /// Task being mutated.
        task_id: TaskId,
        /// Terminal status the task currently holds.
        status: TaskStatus,
    },

    /// The requested status is not reachable from the current one.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Task being mutated.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// Entering the scheduled column requires an assignee and a time.
    #[error("task {task_id} needs an assignee and a scheduled time to enter the scheduled column")]
    MissingScheduleDetails {
        /// Task being mutated.
        task_id: TaskId,
    },

    /// The account identifier is empty after trimming.
    #[error("account id must not be empty")]
    EmptyAccountId,

    /// The customer domain is empty after trimming.
    #[error("customer domain must not be empty")]
    EmptyCustomerDomain,

    /// The actor identifier is invalid.
    #[error(transparent)]
    Actor(#[from] EmptyActorId),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing board event kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown board event kind: {0}")]
pub struct ParseBoardEventKindError(pub String);
