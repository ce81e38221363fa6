//! Opportunity pipeline stages.

use super::ParseStageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a sales opportunity within the pipeline.
///
/// Stage changes are deliberately direction-free: sellers may move an
/// opportunity backward (for example `Proposal` to `Presentation`). Only
/// the terminal stages refuse further movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Initial stage for every new opportunity.
    Negotiation,
    /// Product presentation in progress.
    Presentation,
    /// A formal proposal has been sent.
    Proposal,
    /// The customer is on a time-boxed product trial.
    Trial,
    /// The trial window has elapsed; awaiting a close decision.
    TrialExpiring,
    /// The deal closed successfully. Terminal.
    Won,
    /// The deal was lost. Terminal.
    Lost,
}

impl Stage {
    /// All pipeline stages in catalog order.
    pub const ALL: [Self; 7] = [
        Self::Negotiation,
        Self::Presentation,
        Self::Proposal,
        Self::Trial,
        Self::TrialExpiring,
        Self::Won,
        Self::Lost,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negotiation => "negotiation",
            Self::Presentation => "presentation",
            Self::Proposal => "proposal",
            Self::Trial => "trial",
            Self::TrialExpiring => "trial_expiring",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Returns `true` for stages that accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Returns `true` for stages that require a trial window on the entity.
    #[must_use]
    pub const fn requires_trial_window(self) -> bool {
        matches!(self, Self::Trial | Self::TrialExpiring)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Stage {
    type Error = ParseStageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "negotiation" => Ok(Self::Negotiation),
            "presentation" => Ok(Self::Presentation),
            "proposal" => Ok(Self::Proposal),
            "trial" => Ok(Self::Trial),
            "trial_expiring" => Ok(Self::TrialExpiring),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(ParseStageError(value.to_owned())),
        }
    }
}
