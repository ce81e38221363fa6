//! End-to-end integration tests for trial scheduling and expiry.

use super::helpers::{build_engine, seller};
use chrono::{Duration, Utc};
use dealflow::pipeline::{
    domain::Stage,
    services::{CreateOpportunityRequest, TransitionRequest},
};
use dealflow::scheduler::domain::{JobKey, JobName, JobStatus};
use dealflow::scheduler::ports::JobStore;
use dealflow::trial::{TRIAL_END_JOB, TRIAL_REMINDER_JOB};

#[tokio::test(flavor = "multi_thread")]
async fn entering_trial_schedules_both_jobs_at_the_right_times() {
    let engine = build_engine();
    let now = Utc::now();
    let ends_at = now + Duration::days(14);

    let created = engine
        .pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 250_000))
        .await
        .expect("creation should succeed");
    engine
        .pipeline
        .set_trial_window(created.id(), ends_at)
        .await
        .expect("window should set");
    engine
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Trial, seller()))
        .await
        .expect("trial transition should succeed");

    let key = JobKey::new(created.id().to_string()).expect("valid key");
    let reminder = engine
        .job_store
        .find_pending(&key, &JobName::new(TRIAL_REMINDER_JOB).expect("valid name"))
        .await
        .expect("lookup should succeed")
        .expect("reminder job should be pending");
    assert_eq!(reminder.fire_at(), now + Duration::days(9));

    let expiry = engine
        .job_store
        .find_pending(&key, &JobName::new(TRIAL_END_JOB).expect("valid name"))
        .await
        .expect("lookup should succeed")
        .expect("expiry job should be pending");
    assert_eq!(expiry.fire_at(), ends_at);
}

#[tokio::test(flavor = "multi_thread")]
async fn the_full_trial_window_plays_out() {
    let engine = build_engine();
    let now = Utc::now();
    let ends_at = now + Duration::days(14);

    let created = engine
        .pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 250_000))
        .await
        .expect("creation should succeed");
    engine
        .pipeline
        .set_trial_window(created.id(), ends_at)
        .await
        .expect("window should set");
    engine
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Trial, seller()))
        .await
        .expect("trial transition should succeed");

    // Day 9: the reminder fires and notifies, nothing else changes.
    let reminder_report = engine
        .scheduler
        .run_once(now + Duration::days(9))
        .await
        .expect("dispatch should succeed");
    assert_eq!(reminder_report.fired, 1);
    assert_eq!(engine.notifier.sent(), vec![(created.id(), ends_at)]);

    // Day 14: the expiry fires and the stage follows.
    let expiry_report = engine
        .scheduler
        .run_once(ends_at)
        .await
        .expect("dispatch should succeed");
    assert_eq!(expiry_report.fired, 1);

    let expired = engine
        .pipeline
        .get(created.id())
        .await
        .expect("get should succeed");
    assert_eq!(expired.stage(), Stage::TrialExpiring);

    // A later pass finds nothing left to do.
    let quiet = engine
        .scheduler
        .run_once(ends_at + Duration::days(1))
        .await
        .expect("dispatch should succeed");
    assert_eq!(quiet.fired, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn winning_before_the_window_closes_cancels_the_expiry() {
    let engine = build_engine();
    let now = Utc::now();
    let ends_at = now + Duration::days(14);

    let created = engine
        .pipeline
        .create(CreateOpportunityRequest::new("Globex", "seller-1", 250_000))
        .await
        .expect("creation should succeed");
    engine
        .pipeline
        .set_trial_window(created.id(), ends_at)
        .await
        .expect("window should set");
    engine
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Trial, seller()))
        .await
        .expect("trial transition should succeed");

    let key = JobKey::new(created.id().to_string()).expect("valid key");
    let expiry = engine
        .job_store
        .find_pending(&key, &JobName::new(TRIAL_END_JOB).expect("valid name"))
        .await
        .expect("lookup should succeed")
        .expect("expiry job should be pending");

    // Won at day 12, before the window closes.
    engine
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Won, seller()))
        .await
        .expect("winning should succeed");

    let cancelled = engine
        .job_store
        .find_by_id(expiry.id())
        .await
        .expect("lookup should succeed")
        .expect("job should exist");
    assert_eq!(cancelled.status(), JobStatus::Cancelled);

    // The window closing is now a non-event.
    let report = engine
        .scheduler
        .run_once(ends_at)
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.fired, 0);
    let won = engine
        .pipeline
        .get(created.id())
        .await
        .expect("get should succeed");
    assert_eq!(won.stage(), Stage::Won);
}
