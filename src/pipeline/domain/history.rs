//! Append-only stage history records.

use super::{OpportunityId, Stage};
use crate::identity::ActorId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One immutable audit record describing a stage change.
///
/// Every successful transition appends exactly one record; opening an
/// opportunity appends the creation record with `from_stage = None`.
/// Records are listed in `created_at` order with insertion-sequence
/// tie-break, both owned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageHistoryRecord {
    opportunity_id: OpportunityId,
    actor: ActorId,
    from_stage: Option<Stage>,
    to_stage: Stage,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl StageHistoryRecord {
    /// Creates the creation record written when an opportunity is opened.
    #[must_use]
    pub fn creation(opportunity_id: OpportunityId, actor: ActorId, clock: &impl Clock) -> Self {
        Self {
            opportunity_id,
            actor,
            from_stage: None,
            to_stage: Stage::Negotiation,
            note: None,
            created_at: clock.utc(),
        }
    }

    /// Creates the record for a stage transition.
    #[must_use]
    pub fn transition(
        opportunity_id: OpportunityId,
        actor: ActorId,
        from_stage: Stage,
        to_stage: Stage,
        note: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            opportunity_id,
            actor,
            from_stage: Some(from_stage),
            to_stage,
            note,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        opportunity_id: OpportunityId,
        actor: ActorId,
        from_stage: Option<Stage>,
        to_stage: Stage,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            opportunity_id,
            actor,
            from_stage,
            to_stage,
            note,
            created_at,
        }
    }

    /// Returns the parent opportunity identifier.
    #[must_use]
    pub const fn opportunity_id(&self) -> OpportunityId {
        self.opportunity_id
    }

    /// Returns the actor who performed the change.
    #[must_use]
    pub const fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Returns the stage left, or `None` for the creation record.
    #[must_use]
    pub const fn from_stage(&self) -> Option<Stage> {
        self.from_stage
    }

    /// Returns the stage entered.
    #[must_use]
    pub const fn to_stage(&self) -> Stage {
        self.to_stage
    }

    /// Returns the note attached to the change, if any.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns the record timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
