//! Transition events emitted to observers after a committed stage change.

use super::{OpportunityId, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification of one committed stage transition.
///
/// Emitted after the entity and its history record are durably written.
/// Delivery is at-least-once; observers must be idempotent under
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Opportunity that changed stage.
    pub opportunity_id: OpportunityId,
    /// Stage the opportunity left.
    pub from_stage: Stage,
    /// Stage the opportunity entered.
    pub to_stage: Stage,
    /// Trial window end at commit time, if set.
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Commit timestamp.
    pub occurred_at: DateTime<Utc>,
}
