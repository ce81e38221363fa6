//! Diesel row models for delayed job persistence.

use super::schema::delayed_jobs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for delayed jobs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = delayed_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Business key.
    pub key: String,
    /// Job name.
    pub name: String,
    /// Opaque payload.
    pub payload: Value,
    /// Fire time.
    pub fire_at: DateTime<Utc>,
    /// Job status.
    pub status: String,
    /// Failed attempts so far.
    pub attempts: i32,
    /// Last handler error, if any.
    pub last_error: Option<String>,
    /// Insertion sequence.
    pub insertion_seq: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for delayed jobs; the insertion sequence is assigned by
/// the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = delayed_jobs)]
pub struct NewJobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Business key.
    pub key: String,
    /// Job name.
    pub name: String,
    /// Opaque payload.
    pub payload: Value,
    /// Fire time.
    pub fire_at: DateTime<Utc>,
    /// Job status.
    pub status: String,
    /// Failed attempts so far.
    pub attempts: i32,
    /// Last handler error, if any.
    pub last_error: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied by job state updates.
///
/// `None` writes NULL so the row always mirrors the domain entity.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = delayed_jobs)]
#[diesel(treat_none_as_null = true)]
pub struct JobChangeset {
    /// Fire time.
    pub fire_at: DateTime<Utc>,
    /// Job status.
    pub status: String,
    /// Failed attempts so far.
    pub attempts: i32,
    /// Last handler error, if any.
    pub last_error: Option<String>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}
