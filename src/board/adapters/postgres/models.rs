//! Diesel row models for board persistence.

use super::schema::{implementation_events, implementation_tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = implementation_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Customer account identifier.
    pub account_id: String,
    /// Customer web domain.
    pub domain: String,
    /// Optional market segment.
    pub segment: Option<String>,
    /// Board status.
    pub status: String,
    /// Assignee, if scheduled.
    pub assignee_id: Option<String>,
    /// Scheduled time, if scheduled.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Position within the status column.
    pub position: i32,
    /// Insertion sequence.
    pub insertion_seq: i64,
    /// Creating actor.
    pub created_by: String,
    /// Optimistic concurrency token.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records; the insertion sequence is assigned by
/// the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = implementation_tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Customer account identifier.
    pub account_id: String,
    /// Customer web domain.
    pub domain: String,
    /// Optional market segment.
    pub segment: Option<String>,
    /// Board status.
    pub status: String,
    /// Assignee, if scheduled.
    pub assignee_id: Option<String>,
    /// Scheduled time, if scheduled.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Position within the status column.
    pub position: i32,
    /// Creating actor.
    pub created_by: String,
    /// Optimistic concurrency token.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied by version-guarded commits.
///
/// `None` writes NULL so the row always mirrors the domain entity.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = implementation_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    /// Board status.
    pub status: String,
    /// Assignee, if scheduled.
    pub assignee_id: Option<String>,
    /// Scheduled time, if scheduled.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Position within the status column.
    pub position: i32,
    /// Optimistic concurrency token after the mutation.
    pub version: i64,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for board events.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = implementation_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EventRow {
    /// Insertion sequence.
    pub id: i64,
    /// Parent task identifier.
    pub task_id: uuid::Uuid,
    /// Event kind.
    pub kind: String,
    /// Structured payload.
    pub payload: Value,
    /// Actor who caused the event.
    pub created_by: String,
    /// Event timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for board events; the sequence is assigned by the
/// database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = implementation_events)]
pub struct NewEventRow {
    /// Parent task identifier.
    pub task_id: uuid::Uuid,
    /// Event kind.
    pub kind: String,
    /// Structured payload.
    pub payload: Value,
    /// Actor who caused the event.
    pub created_by: String,
    /// Event timestamp.
    pub created_at: DateTime<Utc>,
}
