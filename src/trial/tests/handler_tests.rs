//! Unit tests for the trial job handlers.

use crate::identity::ActorId;
use crate::pipeline::{
    adapters::memory::InMemoryOpportunityRepository,
    domain::{Opportunity, Stage, StageCatalog},
    services::{CreateOpportunityRequest, OpportunityPipeline, TransitionRequest},
};
use crate::scheduler::{
    adapters::memory::InMemoryJobStore,
    domain::{DelayedJob, JobKey, JobName, JobStatus},
    ports::{JobHandler, JobStore},
    services::DelayedJobScheduler,
};
use crate::trial::{
    RecordingReminderNotifier, ReminderNotifier, ReminderNotifierError, TRIAL_END_JOB,
    TRIAL_REMINDER_JOB, TrialEndHandler, TrialJobPayload, TrialReminderHandler, install,
};
use crate::pipeline::domain::OpportunityId;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::DefaultClock;
use std::sync::Arc;

type TestPipeline = OpportunityPipeline<InMemoryOpportunityRepository, DefaultClock>;
type TestScheduler = DelayedJobScheduler<InMemoryJobStore, DefaultClock>;

struct Stack {
    store: Arc<InMemoryJobStore>,
    pipeline: Arc<TestPipeline>,
    scheduler: Arc<TestScheduler>,
    notifier: Arc<RecordingReminderNotifier>,
}

fn build_stack() -> Stack {
    let store = Arc::new(InMemoryJobStore::new());
    let pipeline = Arc::new(OpportunityPipeline::new(
        Arc::new(InMemoryOpportunityRepository::new()),
        Arc::new(StageCatalog::standard()),
        Arc::new(DefaultClock),
    ));
    let scheduler = Arc::new(DelayedJobScheduler::new(store.clone(), Arc::new(DefaultClock)));
    let notifier = Arc::new(RecordingReminderNotifier::new());
    install(&pipeline, &scheduler, notifier.clone()).expect("install should succeed");
    Stack {
        store,
        pipeline,
        scheduler,
        notifier,
    }
}

fn seller() -> ActorId {
    ActorId::new("seller-1").expect("valid actor")
}

async fn opportunity_in_trial(stack: &Stack, ends_at: DateTime<Utc>) -> Opportunity {
    let created = stack
        .pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 48_000))
        .await
        .expect("creation should succeed");
    stack
        .pipeline
        .set_trial_window(created.id(), ends_at)
        .await
        .expect("window should set");
    stack
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Trial, seller()))
        .await
        .expect("trial transition should succeed")
}

fn expiry_job(opportunity: &Opportunity, ends_at: DateTime<Utc>) -> DelayedJob {
    let payload = serde_json::to_value(TrialJobPayload {
        opportunity_id: opportunity.id(),
        trial_ends_at: ends_at,
    })
    .expect("payload should serialise");
    DelayedJob::new(
        JobKey::new(opportunity.id().to_string()).expect("valid key"),
        JobName::new(TRIAL_END_JOB).expect("valid name"),
        payload,
        ends_at,
        &DefaultClock,
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn expiry_moves_the_trial_to_trial_expiring() {
    let stack = build_stack();
    let ends_at = Utc::now() + Duration::days(14);
    let opportunity = opportunity_in_trial(&stack, ends_at).await;

    let report = stack
        .scheduler
        .run_once(ends_at)
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.fired, 2, "reminder and expiry both fire by the window end");

    let expired = stack
        .pipeline
        .get(opportunity.id())
        .await
        .expect("get should succeed");
    assert_eq!(expired.stage(), Stage::TrialExpiring);

    let history = stack
        .pipeline
        .list_history(opportunity.id())
        .await
        .expect("history should list");
    assert_eq!(history.len(), 3);
    let last = history.last().expect("expiry record should exist");
    assert_eq!(last.to_stage(), Stage::TrialExpiring);
    assert!(last.actor().is_system());
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_expiry_firings_apply_the_transition_once() {
    let stack = build_stack();
    let ends_at = Utc::now() + Duration::days(14);
    let opportunity = opportunity_in_trial(&stack, ends_at).await;

    let handler = TrialEndHandler::new(Arc::clone(&stack.pipeline));
    let job = expiry_job(&opportunity, ends_at);

    handler
        .handle(&job)
        .await
        .expect("first firing should succeed");
    handler
        .handle(&job)
        .await
        .expect("duplicate firing should be a no-op");

    let history = stack
        .pipeline
        .list_history(opportunity.id())
        .await
        .expect("history should list");
    assert_eq!(history.len(), 3, "exactly one expiry transition is recorded");
}

#[tokio::test(flavor = "multi_thread")]
async fn expiry_never_fires_for_an_opportunity_that_left_trial() {
    let stack = build_stack();
    let ends_at = Utc::now() + Duration::days(14);
    let opportunity = opportunity_in_trial(&stack, ends_at).await;
    stack
        .pipeline
        .transition(TransitionRequest::new(opportunity.id(), Stage::Won, seller()))
        .await
        .expect("winning should succeed");

    // The scheduled firing never happens: the job was cancelled on exit.
    let report = stack
        .scheduler
        .run_once(ends_at)
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.fired, 0);

    // A stale replay (crash recovery) is still a no-op.
    let handler = TrialEndHandler::new(Arc::clone(&stack.pipeline));
    handler
        .handle(&expiry_job(&opportunity, ends_at))
        .await
        .expect("stale firing should be a no-op");
    let current = stack
        .pipeline
        .get(opportunity.id())
        .await
        .expect("get should succeed");
    assert_eq!(current.stage(), Stage::Won);
}

#[tokio::test(flavor = "multi_thread")]
async fn reminder_notifies_without_touching_the_stage() {
    let stack = build_stack();
    let ends_at = Utc::now() + Duration::days(14);
    let opportunity = opportunity_in_trial(&stack, ends_at).await;

    let report = stack
        .scheduler
        .run_once(ends_at - Duration::days(5))
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.fired, 1, "only the reminder is due");

    assert_eq!(stack.notifier.sent(), vec![(opportunity.id(), ends_at)]);
    let current = stack
        .pipeline
        .get(opportunity.id())
        .await
        .expect("get should succeed");
    assert_eq!(current.stage(), Stage::Trial);

    let key = JobKey::new(opportunity.id().to_string()).expect("valid key");
    let expiry = stack
        .store
        .find_pending(&key, &JobName::new(TRIAL_END_JOB).expect("valid name"))
        .await
        .expect("lookup should succeed")
        .expect("expiry job should still be pending");
    assert_eq!(expiry.status(), JobStatus::Pending);
}

mockall::mock! {
    Notifier {}

    #[async_trait]
    impl ReminderNotifier for Notifier {
        async fn trial_expiring_soon(
            &self,
            opportunity_id: OpportunityId,
            trial_ends_at: DateTime<Utc>,
        ) -> Result<(), ReminderNotifierError>;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn notifier_failure_does_not_fail_the_reminder_firing() {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_trial_expiring_soon()
        .returning(|_, _| Err(ReminderNotifierError::new("smtp down")));
    let handler = TrialReminderHandler::new(Arc::new(notifier));

    let payload = serde_json::to_value(TrialJobPayload {
        opportunity_id: OpportunityId::new(),
        trial_ends_at: Utc::now(),
    })
    .expect("payload should serialise");
    let job = DelayedJob::new(
        JobKey::new("opp-1").expect("valid key"),
        JobName::new(TRIAL_REMINDER_JOB).expect("valid name"),
        payload,
        Utc::now(),
        &DefaultClock,
    );

    handler
        .handle(&job)
        .await
        .expect("reminder dispatch is fire-and-forget");
}
