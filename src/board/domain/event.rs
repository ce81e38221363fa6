//! Append-only board events.

use super::{ParseBoardEventKindError, TaskId};
use crate::identity::ActorId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Kind of a board event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardEventKind {
    /// The task was scheduled or rescheduled.
    Scheduled,
    /// The task was completed.
    Done,
    /// The task was marked unsuccessful.
    Unsuccessful,
    /// Free-form commentary on the task.
    Comment,
}

impl BoardEventKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Done => "done",
            Self::Unsuccessful => "unsuccessful",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for BoardEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BoardEventKind {
    type Error = ParseBoardEventKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "done" => Ok(Self::Done),
            "unsuccessful" => Ok(Self::Unsuccessful),
            "comment" => Ok(Self::Comment),
            _ => Err(ParseBoardEventKindError(value.to_owned())),
        }
    }
}

/// One immutable audit record on a task's event log.
///
/// Creation writes no event; only status changes and comments are logged.
/// The payload is opaque structured data shaped by the event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEvent {
    task_id: TaskId,
    kind: BoardEventKind,
    payload: Value,
    created_by: ActorId,
    created_at: DateTime<Utc>,
}

impl BoardEvent {
    /// Creates the event logged when a task is scheduled.
    #[must_use]
    pub fn scheduled(
        task_id: TaskId,
        scheduled_at: DateTime<Utc>,
        assignee: &ActorId,
        created_by: ActorId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            task_id,
            kind: BoardEventKind::Scheduled,
            payload: json!({
                "scheduled_at": scheduled_at,
                "assignee_id": assignee,
            }),
            created_by,
            created_at: clock.utc(),
        }
    }

    /// Creates the event logged when a task completes.
    #[must_use]
    pub fn done(
        task_id: TaskId,
        notes: Option<&str>,
        created_by: ActorId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            task_id,
            kind: BoardEventKind::Done,
            payload: json!({ "notes": notes }),
            created_by,
            created_at: clock.utc(),
        }
    }

    /// Creates the event logged when a task is marked unsuccessful.
    #[must_use]
    pub fn unsuccessful(
        task_id: TaskId,
        notes: Option<&str>,
        created_by: ActorId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            task_id,
            kind: BoardEventKind::Unsuccessful,
            payload: json!({ "notes": notes }),
            created_by,
            created_at: clock.utc(),
        }
    }

    /// Creates a comment event.
    #[must_use]
    pub fn comment(
        task_id: TaskId,
        notes: &str,
        created_by: ActorId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            task_id,
            kind: BoardEventKind::Comment,
            payload: json!({ "notes": notes }),
            created_by,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs an event from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        task_id: TaskId,
        kind: BoardEventKind,
        payload: Value,
        created_by: ActorId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            kind,
            payload,
            created_by,
            created_at,
        }
    }

    /// Returns the parent task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> BoardEventKind {
        self.kind
    }

    /// Returns the structured payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the actor who caused the event.
    #[must_use]
    pub const fn created_by(&self) -> &ActorId {
        &self.created_by
    }

    /// Returns the event timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
