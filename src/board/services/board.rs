//! Service layer for implementation board operations.

use crate::board::{
    domain::{
        AccountId, BoardDomainError, BoardEvent, CustomerDomain, ImplementationTask, NewTaskData,
        TaskId, TaskStatus,
    },
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};
use crate::identity::ActorId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating an implementation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    account_id: String,
    domain: String,
    created_by: ActorId,
    segment: Option<String>,
    notes: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        domain: impl Into<String>,
        created_by: ActorId,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            domain: domain.into(),
            created_by,
            segment: None,
            notes: None,
        }
    }

    /// Sets the market segment.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Sets initial notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Request payload for scheduling a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTaskRequest {
    task_id: TaskId,
    scheduled_at: DateTime<Utc>,
    assignee: String,
    performed_by: ActorId,
    notes: Option<String>,
}

impl ScheduleTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        scheduled_at: DateTime<Utc>,
        assignee: impl Into<String>,
        performed_by: ActorId,
    ) -> Self {
        Self {
            task_id,
            scheduled_at,
            assignee: assignee.into(),
            performed_by,
            notes: None,
        }
    }

    /// Sets notes recorded with the scheduling.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Request payload for a board drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTaskRequest {
    task_id: TaskId,
    to_status: TaskStatus,
    to_position: u32,
    performed_by: ActorId,
}

impl MoveTaskRequest {
    /// Creates a move request.
    #[must_use]
    pub const fn new(
        task_id: TaskId,
        to_status: TaskStatus,
        to_position: u32,
        performed_by: ActorId,
    ) -> Self {
        Self {
            task_id,
            to_status,
            to_position,
            performed_by,
        }
    }
}

/// Service-level errors for board operations.
#[derive(Debug, Error)]
pub enum BoardServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] BoardRepositoryError),
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    NotFound(TaskId),
}

/// Result type for board service operations.
pub type BoardServiceResult<T> = Result<T, BoardServiceError>;

/// Implementation board orchestration service.
///
/// Validates status changes, keeps the append-only event log in lockstep
/// with each task, and realises insert-and-shift column ordering through
/// the repository contract.
#[derive(Clone)]
pub struct ImplementationBoard<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ImplementationBoard<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new board service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task at the end of the `Pending` column.
    ///
    /// Creation logs no event; only subsequent transitions do.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when input validation fails or the
    /// repository rejects persistence.
    pub async fn create(
        &self,
        request: CreateTaskRequest,
    ) -> BoardServiceResult<ImplementationTask> {
        let account_id = AccountId::new(request.account_id)?;
        let domain = CustomerDomain::new(request.domain)?;
        let position = self.column_end(TaskStatus::Pending).await?;

        let task = ImplementationTask::open(
            NewTaskData {
                account_id,
                domain,
                segment: request.segment,
                notes: request.notes,
                created_by: request.created_by,
                position,
            },
            &*self.clock,
        );
        self.repository.create(&task).await?;
        Ok(task)
    }

    /// Schedules a task, logging a `scheduled` event.
    ///
    /// Allowed from `Pending` (the card moves to the end of the scheduled
    /// column) and from `Scheduled` (rescheduling in place).
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::NotFound`] for unknown identifiers,
    /// domain errors for illegal status changes, and repository errors
    /// including lost optimistic-lock races.
    pub async fn schedule(
        &self,
        request: ScheduleTaskRequest,
    ) -> BoardServiceResult<ImplementationTask> {
        let mut task = self.find_or_error(request.task_id).await?;
        let expected_version = task.version();
        let entering_column = task.status() == TaskStatus::Pending;
        let assignee = ActorId::new(request.assignee).map_err(BoardDomainError::from)?;

        task.schedule(
            request.scheduled_at,
            assignee.clone(),
            request.notes,
            &*self.clock,
        )?;
        if entering_column {
            let position = self.column_end(TaskStatus::Scheduled).await?;
            task.reposition(position, &*self.clock);
        }

        let event = BoardEvent::scheduled(
            task.id(),
            request.scheduled_at,
            &assignee,
            request.performed_by,
            &*self.clock,
        );
        self.repository
            .commit(&task, Some(&event), expected_version)
            .await?;
        Ok(task)
    }

    /// Completes a scheduled task, logging a `done` event. Terminal.
    ///
    /// # Errors
    ///
    /// As [`schedule`](Self::schedule).
    pub async fn complete(
        &self,
        task_id: TaskId,
        performed_by: ActorId,
        notes: Option<String>,
    ) -> BoardServiceResult<ImplementationTask> {
        let mut task = self.find_or_error(task_id).await?;
        let expected_version = task.version();
        task.complete(notes.clone(), &*self.clock)?;
        let event = BoardEvent::done(task.id(), notes.as_deref(), performed_by, &*self.clock);
        self.repository
            .commit(&task, Some(&event), expected_version)
            .await?;
        Ok(task)
    }

    /// Marks a scheduled task unsuccessful, logging an `unsuccessful`
    /// event. Terminal.
    ///
    /// # Errors
    ///
    /// As [`schedule`](Self::schedule).
    pub async fn mark_unsuccessful(
        &self,
        task_id: TaskId,
        performed_by: ActorId,
        notes: Option<String>,
    ) -> BoardServiceResult<ImplementationTask> {
        let mut task = self.find_or_error(task_id).await?;
        let expected_version = task.version();
        task.mark_unsuccessful(notes.clone(), &*self.clock)?;
        let event =
            BoardEvent::unsuccessful(task.id(), notes.as_deref(), performed_by, &*self.clock);
        self.repository
            .commit(&task, Some(&event), expected_version)
            .await?;
        Ok(task)
    }

    /// Appends a comment event without touching status or position.
    ///
    /// Comments remain possible on finished tasks; terminal statuses only
    /// refuse further status transitions.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::NotFound`] for unknown identifiers and
    /// repository errors for persistence failures.
    pub async fn comment(
        &self,
        task_id: TaskId,
        performed_by: ActorId,
        notes: impl Into<String> + Send,
    ) -> BoardServiceResult<ImplementationTask> {
        let task = self.find_or_error(task_id).await?;
        let event = BoardEvent::comment(task.id(), &notes.into(), performed_by, &*self.clock);
        self.repository.append_event(&event).await?;
        Ok(task)
    }

    /// Applies a board drag with insert-and-shift ordering.
    ///
    /// Same-status moves only reorder and log no event; status-changing
    /// moves log the event matching the resulting status.
    ///
    /// # Errors
    ///
    /// As [`schedule`](Self::schedule), plus
    /// [`BoardDomainError::MissingScheduleDetails`] when dragging into the
    /// scheduled column a task that was never scheduled.
    pub async fn move_task(
        &self,
        request: MoveTaskRequest,
    ) -> BoardServiceResult<ImplementationTask> {
        let mut task = self.find_or_error(request.task_id).await?;
        let expected_version = task.version();
        let from_status = task.status();

        task.move_to(request.to_status, request.to_position, &*self.clock)?;

        let event = if from_status == task.status() {
            None
        } else {
            self.status_event(&task, request.performed_by)?
        };
        self.repository
            .commit_move(&task, event.as_ref(), expected_version)
            .await?;
        Ok(task)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::NotFound`] for unknown identifiers and
    /// repository errors for persistence failures.
    pub async fn get(&self, task_id: TaskId) -> BoardServiceResult<ImplementationTask> {
        self.find_or_error(task_id).await
    }

    /// Lists a task's events in creation order.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub async fn list_events(&self, task_id: TaskId) -> BoardServiceResult<Vec<BoardEvent>> {
        self.find_or_error(task_id).await?;
        Ok(self.repository.list_events(task_id).await?)
    }

    /// Lists one status column in board order.
    ///
    /// # Errors
    ///
    /// Returns repository errors for persistence failures.
    pub async fn list_column(
        &self,
        status: TaskStatus,
    ) -> BoardServiceResult<Vec<ImplementationTask>> {
        Ok(self.repository.list_column(status).await?)
    }

    async fn find_or_error(&self, task_id: TaskId) -> BoardServiceResult<ImplementationTask> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(BoardServiceError::NotFound(task_id))
    }

    async fn column_end(&self, status: TaskStatus) -> BoardRepositoryResult<u32> {
        let column = self.repository.list_column(status).await?;
        Ok(column
            .iter()
            .map(ImplementationTask::position)
            .max()
            .map_or(0, |position| position.saturating_add(1)))
    }

    fn status_event(
        &self,
        task: &ImplementationTask,
        performed_by: ActorId,
    ) -> BoardServiceResult<Option<BoardEvent>> {
        let event = match task.status() {
            TaskStatus::Scheduled => match (task.scheduled_at(), task.assignee_id()) {
                (Some(scheduled_at), Some(assignee)) => Some(BoardEvent::scheduled(
                    task.id(),
                    scheduled_at,
                    assignee,
                    performed_by,
                    &*self.clock,
                )),
                _ => {
                    return Err(BoardServiceError::Domain(
                        BoardDomainError::MissingScheduleDetails { task_id: task.id() },
                    ));
                }
            },
            TaskStatus::Done => Some(BoardEvent::done(
                task.id(),
                task.notes(),
                performed_by,
                &*self.clock,
            )),
            TaskStatus::Unsuccessful => Some(BoardEvent::unsuccessful(
                task.id(),
                task.notes(),
                performed_by,
                &*self.clock,
            )),
            TaskStatus::Pending => None,
        };
        Ok(event)
    }
}
