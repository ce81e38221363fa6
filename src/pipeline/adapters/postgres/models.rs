//! Diesel row models for opportunity persistence.

use super::schema::{opportunities, opportunity_history};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for opportunity records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = opportunities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OpportunityRow {
    /// Opportunity identifier.
    pub id: uuid::Uuid,
    /// Company name.
    pub company_name: String,
    /// Owning seller identifier.
    pub owner: String,
    /// Amount in minor units.
    pub amount_cents: i64,
    /// Current pipeline stage.
    pub stage: String,
    /// End of the trial window, if set.
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Recorded lost reason, if any.
    pub lost_reason: Option<String>,
    /// Tag set as a JSON array.
    pub tags: Value,
    /// Optimistic concurrency token.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for opportunity records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = opportunities)]
pub struct NewOpportunityRow {
    /// Opportunity identifier.
    pub id: uuid::Uuid,
    /// Company name.
    pub company_name: String,
    /// Owning seller identifier.
    pub owner: String,
    /// Amount in minor units.
    pub amount_cents: i64,
    /// Current pipeline stage.
    pub stage: String,
    /// End of the trial window, if set.
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Recorded lost reason, if any.
    pub lost_reason: Option<String>,
    /// Tag set as a JSON array.
    pub tags: Value,
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
#[diesel(table_name = opportunities)]
#[diesel(treat_none_as_null = true)]
pub struct OpportunityChangeset {
    /// Current pipeline stage.
    pub stage: String,
    /// End of the trial window, if set.
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Recorded lost reason, if any.
    pub lost_reason: Option<String>,
    /// Tag set as a JSON array.
    pub tags: Value,
    /// Optimistic concurrency token after the mutation.
    pub version: i64,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for stage history records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = opportunity_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    /// Insertion sequence.
    pub id: i64,
    /// Parent opportunity identifier.
    pub opportunity_id: uuid::Uuid,
    /// Actor who performed the change.
    pub actor: String,
    /// Stage left, NULL for the creation record.
    pub from_stage: Option<String>,
    /// Stage entered.
    pub to_stage: String,
    /// Optional note.
    pub note: Option<String>,
    /// Record timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for stage history records; the sequence is assigned by
/// the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = opportunity_history)]
pub struct NewHistoryRow {
    /// Parent opportunity identifier.
    pub opportunity_id: uuid::Uuid,
    /// Actor who performed the change.
    pub actor: String,
    /// Stage left, NULL for the creation record.
    pub from_stage: Option<String>,
    /// Stage entered.
    pub to_stage: String,
    /// Optional note.
    pub note: Option<String>,
    /// Record timestamp.
    pub created_at: DateTime<Utc>,
}
