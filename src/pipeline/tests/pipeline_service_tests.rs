//! Unit tests for the pipeline service over the in-memory repository.

use crate::identity::ActorId;
use crate::pipeline::{
    adapters::memory::InMemoryOpportunityRepository,
    domain::{PipelineDomainError, Stage, StageCatalog, StageTransition},
    ports::{ObserverError, OpportunityRepository, OpportunityRepositoryError, TransitionObserver},
    services::{
        CreateOpportunityRequest, OpportunityPipeline, PipelineServiceError, TransitionRequest,
    },
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::{Arc, Mutex, PoisonError};

type TestPipeline = OpportunityPipeline<InMemoryOpportunityRepository, DefaultClock>;

fn build_pipeline() -> (Arc<InMemoryOpportunityRepository>, TestPipeline) {
    let repository = Arc::new(InMemoryOpportunityRepository::new());
    let pipeline = OpportunityPipeline::new(
        repository.clone(),
        Arc::new(StageCatalog::standard()),
        Arc::new(DefaultClock),
    );
    (repository, pipeline)
}

#[fixture]
fn pipeline() -> TestPipeline {
    build_pipeline().1
}

fn seller() -> ActorId {
    ActorId::new("seller-1").expect("valid actor")
}

/// Observer that records every transition it sees.
#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<StageTransition>>,
}

impl RecordingObserver {
    fn transitions(&self) -> Vec<StageTransition> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TransitionObserver for RecordingObserver {
    async fn on_transition(&self, transition: &StageTransition) -> Result<(), ObserverError> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(transition.clone());
        Ok(())
    }
}

/// Observer that always fails, for degraded-path coverage.
struct FailingObserver;

#[async_trait]
impl TransitionObserver for FailingObserver {
    async fn on_transition(&self, _transition: &StageTransition) -> Result<(), ObserverError> {
        Err(ObserverError::new("observer offline"))
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_writes_one_creation_record(pipeline: TestPipeline) {
    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");

    assert_eq!(created.stage(), Stage::Negotiation);

    let history = pipeline
        .list_history(created.id())
        .await
        .expect("history should list");
    assert_eq!(history.len(), 1);
    let record = history.first().expect("creation record should exist");
    assert_eq!(record.from_stage(), None);
    assert_eq!(record.to_stage(), Stage::Negotiation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_invalid_input(pipeline: TestPipeline) {
    let result = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", -5))
        .await;
    assert!(matches!(
        result,
        Err(PipelineServiceError::Domain(
            PipelineDomainError::NegativeAmount(-5)
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_appends_exactly_one_record(pipeline: TestPipeline) {
    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");

    let updated = pipeline
        .transition(TransitionRequest::new(
            created.id(),
            Stage::Presentation,
            seller(),
        ))
        .await
        .expect("transition should succeed");

    assert_eq!(updated.stage(), Stage::Presentation);
    let history = pipeline
        .list_history(created.id())
        .await
        .expect("history should list");
    assert_eq!(history.len(), 2);
    let record = history.last().expect("transition record should exist");
    assert_eq!(record.from_stage(), Some(Stage::Negotiation));
    assert_eq!(record.to_stage(), Stage::Presentation);
    assert_eq!(record.actor(), &seller());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_transition_appends_no_record(pipeline: TestPipeline) {
    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");
    pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Proposal, seller()))
        .await
        .expect("move to proposal should succeed");

    let result = pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Lost, seller()))
        .await;
    assert!(matches!(
        result,
        Err(PipelineServiceError::Domain(
            PipelineDomainError::MissingLostReason { .. }
        ))
    ));

    let history = pipeline
        .list_history(created.id())
        .await
        .expect("history should list");
    assert_eq!(history.len(), 2);
    let current = pipeline.get(created.id()).await.expect("get should succeed");
    assert_eq!(current.stage(), Stage::Proposal);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn entering_trial_without_window_leaves_stage_unchanged(pipeline: TestPipeline) {
    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");

    let result = pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Trial, seller()))
        .await;
    assert!(matches!(
        result,
        Err(PipelineServiceError::Domain(
            PipelineDomainError::MissingTrialWindow { .. }
        ))
    ));

    let current = pipeline.get(created.id()).await.expect("get should succeed");
    assert_eq!(current.stage(), Stage::Negotiation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn trial_window_then_trial_transition_succeeds(pipeline: TestPipeline) {
    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");
    let ends_at = Utc::now() + Duration::days(14);

    pipeline
        .set_trial_window(created.id(), ends_at)
        .await
        .expect("window should set");
    let updated = pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Trial, seller()))
        .await
        .expect("trial transition should succeed");

    assert_eq!(updated.stage(), Stage::Trial);
    assert_eq!(updated.trial_ends_at(), Some(ends_at));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_opportunity_is_not_found(pipeline: TestPipeline) {
    let missing = crate::pipeline::domain::OpportunityId::new();
    let result = pipeline.get(missing).await;
    assert!(matches!(result, Err(PipelineServiceError::NotFound(id)) if id == missing));

    let history = pipeline.list_history(missing).await;
    assert!(matches!(
        history,
        Err(PipelineServiceError::NotFound(id)) if id == missing
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn observers_see_committed_transitions(pipeline: TestPipeline) {
    let observer = Arc::new(RecordingObserver::default());
    pipeline.register_observer(observer.clone());

    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");
    pipeline
        .transition(TransitionRequest::new(
            created.id(),
            Stage::Presentation,
            seller(),
        ))
        .await
        .expect("transition should succeed");

    let seen = observer.transitions();
    assert_eq!(seen.len(), 1);
    let event = seen.first().expect("one transition should be recorded");
    assert_eq!(event.opportunity_id, created.id());
    assert_eq!(event.from_stage, Stage::Negotiation);
    assert_eq!(event.to_stage, Stage::Presentation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn observer_failure_does_not_fail_the_transition(pipeline: TestPipeline) {
    pipeline.register_observer(Arc::new(FailingObserver));

    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");
    let updated = pipeline
        .transition(TransitionRequest::new(
            created.id(),
            Stage::Presentation,
            seller(),
        ))
        .await
        .expect("transition should commit despite the failing observer");
    assert_eq!(updated.stage(), Stage::Presentation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_commit_is_a_concurrent_modification() {
    let (repository, pipeline) = build_pipeline();
    let created = pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");

    // A second caller reads the entity, then loses the race.
    let mut stale = pipeline.get(created.id()).await.expect("get should succeed");
    pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Proposal, seller()))
        .await
        .expect("winning transition should succeed");

    stale
        .set_trial_window(Utc::now() + Duration::days(7), &DefaultClock)
        .expect("window should set on the stale copy");
    let result = repository.commit(&stale, None, 0).await;
    assert!(matches!(
        result,
        Err(OpportunityRepositoryError::ConcurrentModification { .. })
    ));
}
