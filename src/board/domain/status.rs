//! Implementation task status and its transition table.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an implementation task on the Kanban board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be scheduled.
    Pending,
    /// Scheduled with an assignee and a time.
    Scheduled,
    /// Implementation finished. Terminal.
    Done,
    /// Implementation abandoned. Terminal.
    Unsuccessful,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Done => "done",
            Self::Unsuccessful => "unsuccessful",
        }
    }

    /// Returns `true` for statuses that accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Unsuccessful)
    }

    /// Returns `true` when a status change from `self` to `to` is legal.
    ///
    /// Same-status moves are reorders, not transitions, and are judged
    /// elsewhere.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Scheduled)
                | (Self::Scheduled, Self::Done)
                | (Self::Scheduled, Self::Unsuccessful)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "scheduled" => Ok(Self::Scheduled),
            "done" => Ok(Self::Done),
            "unsuccessful" => Ok(Self::Unsuccessful),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}
