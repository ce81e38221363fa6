//! Error types for pipeline domain validation and parsing.

use super::{OpportunityId, Stage};
use crate::identity::EmptyActorId;
use thiserror::Error;

/// Errors returned while validating opportunity state and transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineDomainError {
    /// The opportunity is in a terminal stage and accepts no mutation.
    #[error("opportunity {opportunity_id} is in terminal stage {stage} and cannot change")]
    TerminalStage {
        /// Opportunity being mutated.
        opportunity_id: OpportunityId,
        /// Terminal stage the opportunity currently holds.
        stage: Stage,
    },

    /// Moving to LOST from this stage requires a reason note.
    #[error("leaving stage {stage} for lost requires a reason note on opportunity {opportunity_id}")]
    MissingLostReason {
        /// Opportunity being mutated.
        opportunity_id: OpportunityId,
        /// Current stage whose catalog entry demands an exit reason.
        stage: Stage,
    },

    /// Entering a trial stage requires a trial window to be set first.
    #[error("opportunity {opportunity_id} has no trial window set; required to enter {to}")]
    MissingTrialWindow {
        /// Opportunity being mutated.
        opportunity_id: OpportunityId,
        /// Trial stage the caller attempted to enter.
        to: Stage,
    },

    /// The stage catalog has no entry for the given stage name.
    ///
    /// This indicates a configuration or programming error, never direct
    /// user input.
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    /// The opportunity amount is negative.
    #[error("opportunity amount must not be negative, got {0} cents")]
    NegativeAmount(i64),

    /// The company name is empty after trimming.
    #[error("company name must not be empty")]
    EmptyCompanyName,

    /// The actor identifier is invalid.
    #[error(transparent)]
    Actor(#[from] EmptyActorId),
}

/// Errors returned while constructing a stage catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageCatalogError {
    /// A stage appears more than once in the definitions.
    #[error("duplicate catalog definition for stage {0}")]
    DuplicateStage(Stage),

    /// A stage is missing from the definitions.
    ///
    /// Catalogs must cover every pipeline stage so that validation can
    /// never fail on a stage the state machine produces.
    #[error("catalog definition missing for stage {0}")]
    MissingStage(Stage),
}

/// Error returned while parsing stage names from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown stage name: {0}")]
pub struct ParseStageError(pub String);
