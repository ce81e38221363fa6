//! Identifier and validated scalar types for the pipeline domain.

use super::PipelineDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a sales opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpportunityId(Uuid);

impl OpportunityId {
    /// Creates a new random opportunity identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an opportunity identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for OpportunityId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for OpportunityId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative monetary amount in minor units (cents).
///
/// Stored as an integer to keep arithmetic exact; the presentation layer
/// owns currency formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a validated amount from minor units.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::NegativeAmount`] when the value is
    /// negative.
    pub const fn from_cents(cents: i64) -> Result<Self, PipelineDomainError> {
        if cents < 0 {
            return Err(PipelineDomainError::NegativeAmount(cents));
        }
        Ok(Self(cents))
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The zero amount.
    pub const ZERO: Self = Self(0);
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-empty company name attached to an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyName(String);

impl CompanyName {
    /// Creates a validated company name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyCompanyName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(PipelineDomainError::EmptyCompanyName);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the company name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CompanyName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CompanyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
