//! Repository port for opportunity persistence and stage history.

use crate::pipeline::domain::{Opportunity, OpportunityId, StageHistoryRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for opportunity repository operations.
pub type OpportunityRepositoryResult<T> = Result<T, OpportunityRepositoryError>;

/// Opportunity persistence contract.
///
/// Implementations must make each write method atomic: the entity state
/// and its history record become visible together or not at all, and
/// `commit` rejects stale versions so that concurrent mutations of one
/// opportunity serialise.
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// Stores a new opportunity together with its creation history record.
    ///
    /// # Errors
    ///
    /// Returns [`OpportunityRepositoryError::DuplicateOpportunity`] when
    /// the identifier already exists.
    async fn create(
        &self,
        opportunity: &Opportunity,
        record: &StageHistoryRecord,
    ) -> OpportunityRepositoryResult<()>;

    /// Persists a mutated opportunity, optionally appending one history
    /// record in the same atomic unit.
    ///
    /// `expected_version` is the version the caller read before mutating;
    /// the commit applies only when the stored version still matches.
    ///
    /// # Errors
    ///
    /// Returns [`OpportunityRepositoryError::NotFound`] when the
    /// opportunity does not exist and
    /// [`OpportunityRepositoryError::ConcurrentModification`] when the
    /// stored version no longer matches `expected_version`.
    async fn commit(
        &self,
        opportunity: &Opportunity,
        record: Option<&StageHistoryRecord>,
        expected_version: u64,
    ) -> OpportunityRepositoryResult<()>;

    /// Finds an opportunity by identifier.
    ///
    /// Returns `None` when the opportunity does not exist.
    async fn find_by_id(
        &self,
        id: OpportunityId,
    ) -> OpportunityRepositoryResult<Option<Opportunity>>;

    /// Lists the stage history of an opportunity in creation order, ties
    /// broken by insertion sequence.
    async fn list_history(
        &self,
        id: OpportunityId,
    ) -> OpportunityRepositoryResult<Vec<StageHistoryRecord>>;
}

/// Errors returned by opportunity repository implementations.
#[derive(Debug, Clone, Error)]
pub enum OpportunityRepositoryError {
    /// An opportunity with the same identifier already exists.
    #[error("duplicate opportunity identifier: {0}")]
    DuplicateOpportunity(OpportunityId),

    /// The opportunity was not found.
    #[error("opportunity not found: {0}")]
    NotFound(OpportunityId),

    /// The stored version no longer matches the caller's read.
    #[error("concurrent modification of opportunity {opportunity_id}: expected version {expected}")]
    ConcurrentModification {
        /// Opportunity whose commit was rejected.
        opportunity_id: OpportunityId,
        /// Version the caller read before mutating.
        expected: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl OpportunityRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for OpportunityRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        // All Diesel errors surface as persistence errors; adapters map
        // unique violations and missing rows to semantic variants before
        // this conversion applies.
        Self::persistence(err)
    }
}
