//! Service layer for opportunity creation and stage transitions.

use crate::identity::ActorId;
use crate::pipeline::{
    domain::{
        CompanyName, Money, Opportunity, OpportunityId, PipelineDomainError, Stage, StageCatalog,
        StageHistoryRecord, StageTransition,
    },
    ports::{
        ObserverError, OpportunityRepository, OpportunityRepositoryError, TransitionObserver,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::warn;

/// Request payload for opening a new opportunity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOpportunityRequest {
    company_name: String,
    owner: String,
    amount_cents: i64,
    tags: Vec<String>,
}

impl CreateOpportunityRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        company_name: impl Into<String>,
        owner: impl Into<String>,
        amount_cents: i64,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            owner: owner.into(),
            amount_cents,
            tags: Vec::new(),
        }
    }

    /// Sets opportunity tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }
}

/// Request payload for a stage transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    opportunity_id: OpportunityId,
    to_stage: Stage,
    actor: ActorId,
    note: Option<String>,
}

impl TransitionRequest {
    /// Creates a transition request.
    #[must_use]
    pub const fn new(opportunity_id: OpportunityId, to_stage: Stage, actor: ActorId) -> Self {
        Self {
            opportunity_id,
            to_stage,
            actor,
            note: None,
        }
    }

    /// Attaches a note; required when leaving a reason-required stage for
    /// `Lost`.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Service-level errors for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] PipelineDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] OpportunityRepositoryError),
    /// No opportunity exists with the given identifier.
    #[error("opportunity {0} not found")]
    NotFound(OpportunityId),
}

/// Result type for pipeline service operations.
pub type PipelineServiceResult<T> = Result<T, PipelineServiceError>;

/// Opportunity pipeline orchestration service.
///
/// Validates and applies stage transitions, keeps the append-only stage
/// history in lockstep with the entity, and notifies registered observers
/// after each commit.
pub struct OpportunityPipeline<R, C>
where
    R: OpportunityRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    catalog: Arc<StageCatalog>,
    clock: Arc<C>,
    observers: RwLock<Vec<Arc<dyn TransitionObserver>>>,
}

impl<R, C> OpportunityPipeline<R, C>
where
    R: OpportunityRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new pipeline service.
    #[must_use]
    pub fn new(repository: Arc<R>, catalog: Arc<StageCatalog>, clock: Arc<C>) -> Self {
        Self {
            repository,
            catalog,
            clock,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Registers an observer for committed stage transitions.
    ///
    /// Registration happens once at wiring time, before traffic arrives.
    pub fn register_observer(&self, observer: Arc<dyn TransitionObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Opens a new opportunity in `Negotiation` and writes its creation
    /// history record in the same atomic unit.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineServiceError`] when input validation fails or the
    /// repository rejects persistence.
    pub async fn create(
        &self,
        request: CreateOpportunityRequest,
    ) -> PipelineServiceResult<Opportunity> {
        let company_name = CompanyName::new(request.company_name)?;
        let owner = ActorId::new(request.owner).map_err(PipelineDomainError::from)?;
        let amount = Money::from_cents(request.amount_cents)?;
        let tags = request.tags.into_iter().collect();

        let opportunity = Opportunity::open(company_name, owner.clone(), amount, tags, &*self.clock);
        let record = StageHistoryRecord::creation(opportunity.id(), owner, &*self.clock);
        self.repository.create(&opportunity, &record).await?;
        Ok(opportunity)
    }

    /// Sets the trial window on a non-terminal opportunity.
    ///
    /// Must be called before (or between) transitions into `Trial`; it
    /// writes no history record of its own.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineServiceError::NotFound`] for unknown identifiers,
    /// domain errors for terminal opportunities, and repository errors
    /// including lost optimistic-lock races.
    pub async fn set_trial_window(
        &self,
        opportunity_id: OpportunityId,
        trial_ends_at: DateTime<Utc>,
    ) -> PipelineServiceResult<Opportunity> {
        let mut opportunity = self.find_or_error(opportunity_id).await?;
        let expected_version = opportunity.version();
        opportunity.set_trial_window(trial_ends_at, &*self.clock)?;
        self.repository
            .commit(&opportunity, None, expected_version)
            .await?;
        Ok(opportunity)
    }

    /// Applies a stage transition.
    ///
    /// The read-validate-commit sequence is guarded by the opportunity's
    /// optimistic version: a concurrent transition on the same entity
    /// surfaces as
    /// [`OpportunityRepositoryError::ConcurrentModification`] and the
    /// caller should retry. The history record commits atomically with the
    /// entity; observers are notified only after the commit succeeds, and
    /// observer failures are logged rather than surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineServiceError::NotFound`] for unknown identifiers,
    /// domain errors for invalid transitions, and repository errors.
    pub async fn transition(
        &self,
        request: TransitionRequest,
    ) -> PipelineServiceResult<Opportunity> {
        let mut opportunity = self.find_or_error(request.opportunity_id).await?;
        let expected_version = opportunity.version();
        let from_stage = opportunity.stage();

        opportunity.apply_transition(
            request.to_stage,
            &self.catalog,
            request.note.as_deref(),
            &*self.clock,
        )?;
        let record = StageHistoryRecord::transition(
            opportunity.id(),
            request.actor,
            from_stage,
            request.to_stage,
            request.note,
            &*self.clock,
        );
        self.repository
            .commit(&opportunity, Some(&record), expected_version)
            .await?;

        let transition = StageTransition {
            opportunity_id: opportunity.id(),
            from_stage,
            to_stage: request.to_stage,
            trial_ends_at: opportunity.trial_ends_at(),
            occurred_at: opportunity.updated_at(),
        };
        self.notify_observers(&transition).await;
        Ok(opportunity)
    }

    /// Retrieves an opportunity by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineServiceError::NotFound`] for unknown identifiers
    /// and repository errors for persistence failures.
    pub async fn get(&self, opportunity_id: OpportunityId) -> PipelineServiceResult<Opportunity> {
        self.find_or_error(opportunity_id).await
    }

    /// Lists the stage history of an opportunity in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineServiceError::NotFound`] for unknown identifiers
    /// and repository errors for persistence failures.
    pub async fn list_history(
        &self,
        opportunity_id: OpportunityId,
    ) -> PipelineServiceResult<Vec<StageHistoryRecord>> {
        self.find_or_error(opportunity_id).await?;
        Ok(self.repository.list_history(opportunity_id).await?)
    }

    /// Returns the catalog this pipeline validates against.
    #[must_use]
    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    async fn find_or_error(
        &self,
        opportunity_id: OpportunityId,
    ) -> PipelineServiceResult<Opportunity> {
        self.repository
            .find_by_id(opportunity_id)
            .await?
            .ok_or(PipelineServiceError::NotFound(opportunity_id))
    }

    async fn notify_observers(&self, transition: &StageTransition) {
        let observers: Vec<Arc<dyn TransitionObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            if let Err(err) = observer.on_transition(transition).await {
                log_observer_failure(transition, &err);
            }
        }
    }
}

fn log_observer_failure(transition: &StageTransition, err: &ObserverError) {
    warn!(
        opportunity_id = %transition.opportunity_id,
        from_stage = %transition.from_stage,
        to_stage = %transition.to_stage,
        error = %err,
        "transition observer failed; transition remains committed"
    );
}
