//! Repository port for implementation task persistence and events.

use crate::board::domain::{BoardEvent, ImplementationTask, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for board repository operations.
pub type BoardRepositoryResult<T> = Result<T, BoardRepositoryError>;

/// Implementation task persistence contract.
///
/// Write methods are atomic units: the task, its optional event, and any
/// sibling position shifts become visible together or not at all, and
/// version guards serialise concurrent commits to one task.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Stores a new task. Creation logs no event.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateTask`] when the identifier
    /// already exists.
    async fn create(&self, task: &ImplementationTask) -> BoardRepositoryResult<()>;

    /// Persists a mutated task, optionally appending one event in the same
    /// atomic unit.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::NotFound`] when the task does not
    /// exist and [`BoardRepositoryError::ConcurrentModification`] when the
    /// stored version no longer matches `expected_version`.
    async fn commit(
        &self,
        task: &ImplementationTask,
        event: Option<&BoardEvent>,
        expected_version: u64,
    ) -> BoardRepositoryResult<()>;

    /// Persists a board drag with insert-and-shift semantics.
    ///
    /// In the same atomic unit as the task write, every other task in the
    /// task's (destination) column whose position is at or after the
    /// task's new position moves one slot later, so the requested slot is
    /// free and relative order is preserved.
    ///
    /// # Errors
    ///
    /// As [`commit`](Self::commit).
    async fn commit_move(
        &self,
        task: &ImplementationTask,
        event: Option<&BoardEvent>,
        expected_version: u64,
    ) -> BoardRepositoryResult<()>;

    /// Appends an event without touching the task row.
    ///
    /// Callers verify task existence first; the append itself is
    /// unconditional.
    async fn append_event(&self, event: &BoardEvent) -> BoardRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> BoardRepositoryResult<Option<ImplementationTask>>;

    /// Lists one status column ordered by position, ties broken by
    /// insertion sequence.
    async fn list_column(
        &self,
        status: TaskStatus,
    ) -> BoardRepositoryResult<Vec<ImplementationTask>>;

    /// Lists a task's events in creation order.
    async fn list_events(&self, task_id: TaskId) -> BoardRepositoryResult<Vec<BoardEvent>>;
}

/// Errors returned by board repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BoardRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored version no longer matches the caller's read.
    #[error("concurrent modification of task {task_id}: expected version {expected}")]
    ConcurrentModification {
        /// Task whose commit was rejected.
        task_id: TaskId,
        /// Version the caller read before mutating.
        expected: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for BoardRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        // All Diesel errors surface as persistence errors; adapters map
        // unique violations and missing rows to semantic variants before
        // this conversion applies.
        Self::persistence(err)
    }
}
