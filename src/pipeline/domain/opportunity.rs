//! Opportunity aggregate root and its stage state machine.

use super::{CompanyName, Money, OpportunityId, PipelineDomainError, Stage, StageCatalog};
use crate::identity::ActorId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opportunity aggregate root.
///
/// Mutated only through [`apply_transition`](Self::apply_transition) and
/// [`set_trial_window`](Self::set_trial_window); every mutation bumps the
/// optimistic `version` token that repositories compare-and-swap on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    id: OpportunityId,
    company_name: CompanyName,
    owner: ActorId,
    amount: Money,
    stage: Stage,
    trial_ends_at: Option<DateTime<Utc>>,
    lost_reason: Option<String>,
    tags: BTreeSet<String>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted opportunity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOpportunityData {
    /// Persisted opportunity identifier.
    pub id: OpportunityId,
    /// Persisted company name.
    pub company_name: CompanyName,
    /// Persisted owning seller.
    pub owner: ActorId,
    /// Persisted amount.
    pub amount: Money,
    /// Persisted pipeline stage.
    pub stage: Stage,
    /// Persisted trial window end, if any.
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Persisted lost reason, if any.
    pub lost_reason: Option<String>,
    /// Persisted tags.
    pub tags: BTreeSet<String>,
    /// Persisted optimistic concurrency token.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Opportunity {
    /// Opens a new opportunity in the initial `Negotiation` stage.
    #[must_use]
    pub fn open(
        company_name: CompanyName,
        owner: ActorId,
        amount: Money,
        tags: BTreeSet<String>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: OpportunityId::new(),
            company_name,
            owner,
            amount,
            stage: Stage::Negotiation,
            trial_ends_at: None,
            lost_reason: None,
            tags,
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an opportunity from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOpportunityData) -> Self {
        Self {
            id: data.id,
            company_name: data.company_name,
            owner: data.owner,
            amount: data.amount,
            stage: data.stage,
            trial_ends_at: data.trial_ends_at,
            lost_reason: data.lost_reason,
            tags: data.tags,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the opportunity identifier.
    #[must_use]
    pub const fn id(&self) -> OpportunityId {
        self.id
    }

    /// Returns the company name.
    #[must_use]
    pub const fn company_name(&self) -> &CompanyName {
        &self.company_name
    }

    /// Returns the owning seller.
    #[must_use]
    pub const fn owner(&self) -> &ActorId {
        &self.owner
    }

    /// Returns the amount.
    #[must_use]
    pub const fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the current pipeline stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the end of the trial window, if one has been set.
    #[must_use]
    pub const fn trial_ends_at(&self) -> Option<DateTime<Utc>> {
        self.trial_ends_at
    }

    /// Returns the recorded lost reason, if any.
    #[must_use]
    pub fn lost_reason(&self) -> Option<&str> {
        self.lost_reason.as_deref()
    }

    /// Returns the tag set.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
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

    /// Sets the end of the trial window.
    ///
    /// A plain field update: no history record corresponds to it. The
    /// window must be set before the opportunity can enter [`Stage::Trial`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::TerminalStage`] when the opportunity
    /// is already won or lost.
    pub fn set_trial_window(
        &mut self,
        trial_ends_at: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), PipelineDomainError> {
        self.ensure_not_terminal()?;
        self.trial_ends_at = Some(trial_ends_at);
        self.touch(clock);
        Ok(())
    }

    /// Applies a stage transition after validating it against the catalog.
    ///
    /// Transitions are direction-free apart from the guards below; moving
    /// to `Lost` records the note as the lost reason.
    ///
    /// # Errors
    ///
    /// - [`PipelineDomainError::TerminalStage`] when the current stage is
    ///   won or lost.
    /// - [`PipelineDomainError::MissingLostReason`] when moving to `Lost`
    ///   from a stage whose catalog entry requires an exit reason and no
    ///   note was supplied.
    /// - [`PipelineDomainError::MissingTrialWindow`] when entering a trial
    ///   stage without a trial window on the entity.
    /// - [`PipelineDomainError::UnknownStage`] when the catalog has no
    ///   entry for the current stage (a configuration error).
    pub fn apply_transition(
        &mut self,
        to: Stage,
        catalog: &StageCatalog,
        note: Option<&str>,
        clock: &impl Clock,
    ) -> Result<(), PipelineDomainError> {
        self.ensure_not_terminal()?;

        let current_info = catalog.info(self.stage)?;
        if to == Stage::Lost && current_info.lost_reason_required && note.is_none() {
            return Err(PipelineDomainError::MissingLostReason {
                opportunity_id: self.id,
                stage: self.stage,
            });
        }
        if to.requires_trial_window() && self.trial_ends_at.is_none() {
            return Err(PipelineDomainError::MissingTrialWindow {
                opportunity_id: self.id,
                to,
            });
        }

        self.stage = to;
        if to == Stage::Lost {
            self.lost_reason = note.map(ToOwned::to_owned);
        }
        self.touch(clock);
        Ok(())
    }

    fn ensure_not_terminal(&self) -> Result<(), PipelineDomainError> {
        if self.stage.is_terminal() {
            return Err(PipelineDomainError::TerminalStage {
                opportunity_id: self.id,
                stage: self.stage,
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
