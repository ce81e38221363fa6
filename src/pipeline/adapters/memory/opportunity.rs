//! In-memory repository for pipeline tests and reference semantics.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::pipeline::{
    domain::{Opportunity, OpportunityId, StageHistoryRecord},
    ports::{OpportunityRepository, OpportunityRepositoryError, OpportunityRepositoryResult},
};

/// Thread-safe in-memory opportunity repository.
///
/// The single lock scope per call is the reference implementation of the
/// atomicity contract: entity and history become visible together, and
/// version checks serialise concurrent commits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOpportunityRepository {
    state: Arc<RwLock<InMemoryPipelineState>>,
}

#[derive(Debug, Default)]
struct InMemoryPipelineState {
    opportunities: HashMap<OpportunityId, Opportunity>,
    history: HashMap<OpportunityId, Vec<StageHistoryRecord>>,
}

impl InMemoryOpportunityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpportunityRepository for InMemoryOpportunityRepository {
    async fn create(
        &self,
        opportunity: &Opportunity,
        record: &StageHistoryRecord,
    ) -> OpportunityRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            OpportunityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if state.opportunities.contains_key(&opportunity.id()) {
            return Err(OpportunityRepositoryError::DuplicateOpportunity(
                opportunity.id(),
            ));
        }
        state
            .opportunities
            .insert(opportunity.id(), opportunity.clone());
        state
            .history
            .entry(opportunity.id())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn commit(
        &self,
        opportunity: &Opportunity,
        record: Option<&StageHistoryRecord>,
        expected_version: u64,
    ) -> OpportunityRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            OpportunityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let stored = state
            .opportunities
            .get(&opportunity.id())
            .ok_or(OpportunityRepositoryError::NotFound(opportunity.id()))?;
        if stored.version() != expected_version {
            return Err(OpportunityRepositoryError::ConcurrentModification {
                opportunity_id: opportunity.id(),
                expected: expected_version,
            });
        }
        state
            .opportunities
            .insert(opportunity.id(), opportunity.clone());
        if let Some(entry) = record {
            state
                .history
                .entry(opportunity.id())
                .or_default()
                .push(entry.clone());
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: OpportunityId,
    ) -> OpportunityRepositoryResult<Option<Opportunity>> {
        let state = self.state.read().map_err(|err| {
            OpportunityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.opportunities.get(&id).cloned())
    }

    async fn list_history(
        &self,
        id: OpportunityId,
    ) -> OpportunityRepositoryResult<Vec<StageHistoryRecord>> {
        let state = self.state.read().map_err(|err| {
            OpportunityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut records = state.history.get(&id).cloned().unwrap_or_default();
        // Append order is insertion order; the stable sort keeps it as the
        // tie-break for equal timestamps.
        records.sort_by_key(StageHistoryRecord::created_at);
        Ok(records)
    }
}
