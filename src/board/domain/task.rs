//! Implementation task aggregate root and its status state machine.

use super::{AccountId, BoardDomainError, CustomerDomain, TaskId, TaskStatus};
use crate::identity::ActorId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Implementation task aggregate root.
///
/// Tasks live on a Kanban board: `position` orders cards within their
/// status column. Positions are sort-order-only; duplicates are tolerated
/// and resolved by insertion order on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationTask {
    id: TaskId,
    account_id: AccountId,
    domain: CustomerDomain,
    segment: Option<String>,
    status: TaskStatus,
    assignee_id: Option<ActorId>,
    scheduled_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    position: u32,
    created_by: ActorId,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted customer account identifier.
    pub account_id: AccountId,
    /// Persisted customer domain.
    pub domain: CustomerDomain,
    /// Persisted market segment, if any.
    pub segment: Option<String>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted assignee, if any.
    pub assignee_id: Option<ActorId>,
    /// Persisted scheduled time, if any.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Persisted notes, if any.
    pub notes: Option<String>,
    /// Persisted column position.
    pub position: u32,
    /// Persisted creating actor.
    pub created_by: ActorId,
    /// Persisted optimistic concurrency token.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Construction parameters for a new pending task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Customer account identifier.
    pub account_id: AccountId,
    /// Customer domain.
    pub domain: CustomerDomain,
    /// Optional market segment.
    pub segment: Option<String>,
    /// Optional initial notes.
    pub notes: Option<String>,
    /// Creating actor.
    pub created_by: ActorId,
    /// Position at the end of the pending column.
    pub position: u32,
}

impl ImplementationTask {
    /// Opens a new task in the `Pending` column.
    #[must_use]
    pub fn open(data: NewTaskData, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            account_id: data.account_id,
            domain: data.domain,
            segment: data.segment,
            status: TaskStatus::Pending,
            assignee_id: None,
            scheduled_at: None,
            notes: data.notes,
            position: data.position,
            created_by: data.created_by,
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            account_id: data.account_id,
            domain: data.domain,
            segment: data.segment,
            status: data.status,
            assignee_id: data.assignee_id,
            scheduled_at: data.scheduled_at,
            notes: data.notes,
            position: data.position,
            created_by: data.created_by,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the customer account identifier.
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Returns the customer domain.
    #[must_use]
    pub const fn domain(&self) -> &CustomerDomain {
        &self.domain
    }

    /// Returns the market segment, if any.
    #[must_use]
    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee_id(&self) -> Option<&ActorId> {
        self.assignee_id.as_ref()
    }

    /// Returns the scheduled time, if any.
    #[must_use]
    pub const fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    /// Returns the notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the position within the status column.
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Returns the creating actor.
    #[must_use]
    pub const fn created_by(&self) -> &ActorId {
        &self.created_by
    }

    /// Returns the optimistic concurrency token.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
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

    /// Schedules the task, moving it to the `Scheduled` column.
    ///
    /// Allowed from `Pending` and from `Scheduled` (rescheduling keeps the
    /// card where it is). Provided notes replace the stored notes.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TerminalStatus`] for finished tasks.
    pub fn schedule(
        &mut self,
        scheduled_at: DateTime<Utc>,
        assignee: ActorId,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        self.ensure_not_terminal()?;
        self.scheduled_at = Some(scheduled_at);
        self.assignee_id = Some(assignee);
        if notes.is_some() {
            self.notes = notes;
        }
        self.status = TaskStatus::Scheduled;
        self.touch(clock);
        Ok(())
    }

    /// Completes the task. Terminal.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TerminalStatus`] for finished tasks and
    /// [`BoardDomainError::InvalidStatusTransition`] unless the task is
    /// `Scheduled`.
    pub fn complete(
        &mut self,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        self.finish(TaskStatus::Done, notes, clock)
    }

    /// Marks the task unsuccessful. Terminal.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TerminalStatus`] for finished tasks and
    /// [`BoardDomainError::InvalidStatusTransition`] unless the task is
    /// `Scheduled`.
    pub fn mark_unsuccessful(
        &mut self,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        self.finish(TaskStatus::Unsuccessful, notes, clock)
    }

    /// Applies a board drag: a reorder within the current column or a
    /// legal status change to a new column position.
    ///
    /// # Errors
    ///
    /// - [`BoardDomainError::TerminalStatus`] when the task is finished and
    ///   the target status differs from the current one.
    /// - [`BoardDomainError::InvalidStatusTransition`] when the target
    ///   status is not reachable.
    /// - [`BoardDomainError::MissingScheduleDetails`] when entering the
    ///   scheduled column without an assignee and a time already present.
    pub fn move_to(
        &mut self,
        to_status: TaskStatus,
        to_position: u32,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        if to_status == self.status {
            self.position = to_position;
            self.touch(clock);
            return Ok(());
        }
        self.ensure_not_terminal()?;
        if !self.status.can_transition_to(to_status) {
            return Err(BoardDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: to_status,
            });
        }
        if to_status == TaskStatus::Scheduled
            && (self.assignee_id.is_none() || self.scheduled_at.is_none())
        {
            return Err(BoardDomainError::MissingScheduleDetails { task_id: self.id });
        }
        self.status = to_status;
        self.position = to_position;
        self.touch(clock);
        Ok(())
    }

    /// Places the card at a new position within its current column.
    pub fn reposition(&mut self, position: u32, clock: &impl Clock) {
        self.position = position;
        self.touch(clock);
    }

    /// Moves the card one slot later in its column.
    ///
    /// Used by repositories implementing insert-and-shift; sibling shifts
    /// are part of another task's commit and do not advance this task's
    /// version token.
    pub const fn displace(&mut self) {
        self.position += 1;
    }

    fn finish(
        &mut self,
        to_status: TaskStatus,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        self.ensure_not_terminal()?;
        if self.status != TaskStatus::Scheduled {
            return Err(BoardDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: to_status,
            });
        }
        if notes.is_some() {
            self.notes = notes;
        }
        self.status = to_status;
        self.touch(clock);
        Ok(())
    }

    fn ensure_not_terminal(&self) -> Result<(), BoardDomainError> {
        if self.status.is_terminal() {
            return Err(BoardDomainError::TerminalStatus {
                task_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Advances `updated_at` and the optimistic version token.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.version += 1;
    }
}
