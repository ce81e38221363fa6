//! Actor identity shared by the pipeline and board contexts.
//!
//! Every mutating call into the core receives an already-authenticated
//! actor identifier; this crate performs no authentication of its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reserved actor identifier for scheduler-driven mutations.
const SYSTEM_ACTOR: &str = "system";

/// Error returned when an actor identifier is empty after trimming.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("actor id must not be empty")]
pub struct EmptyActorId;

/// Identifier of the authenticated actor performing a mutation.
///
/// Actor identifiers are opaque to this crate; they are recorded verbatim
/// on audit records. The reserved value [`ActorId::system`] marks
/// transitions applied by the scheduler rather than a human seller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates a validated actor identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyActorId`] when the value is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyActorId> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(EmptyActorId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the reserved system actor used by scheduler-driven jobs.
    #[must_use]
    pub fn system() -> Self {
        Self(SYSTEM_ACTOR.to_owned())
    }

    /// Returns `true` when this is the reserved system actor.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_ACTOR
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ActorId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
