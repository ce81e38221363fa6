//! Unit tests for the delayed job state machine.

use crate::scheduler::domain::{
    DelayedJob, JobKey, JobName, JobStatus, SchedulerDomainError,
};
use chrono::{Duration, Utc};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn job() -> DelayedJob {
    DelayedJob::new(
        JobKey::new("opp-1").expect("valid key"),
        JobName::new("trial-end").expect("valid name"),
        json!({"opportunity_id": "opp-1"}),
        Utc::now(),
        &DefaultClock,
    )
}

#[test]
fn keys_and_names_reject_empty_values() {
    assert_eq!(JobKey::new("  "), Err(SchedulerDomainError::EmptyJobKey));
    assert_eq!(JobName::new(""), Err(SchedulerDomainError::EmptyJobName));
}

#[rstest]
fn status_names_round_trip(
    #[values(JobStatus::Pending, JobStatus::Fired, JobStatus::Cancelled)] status: JobStatus,
) {
    assert_eq!(JobStatus::try_from(status.as_str()), Ok(status));
}

#[rstest]
#[case(JobStatus::Pending, false)]
#[case(JobStatus::Fired, true)]
#[case(JobStatus::Cancelled, true)]
fn is_settled_returns_expected(#[case] status: JobStatus, #[case] expected: bool) {
    assert_eq!(status.is_settled(), expected);
}

#[rstest]
fn job_is_due_once_fire_time_elapses(job: DelayedJob) {
    assert!(job.is_due(job.fire_at()));
    assert!(job.is_due(job.fire_at() + Duration::seconds(1)));
    assert!(!job.is_due(job.fire_at() - Duration::seconds(1)));
}

#[rstest]
fn settled_jobs_reject_further_changes(mut job: DelayedJob) -> eyre::Result<()> {
    job.mark_fired(&DefaultClock)?;
    ensure!(job.status() == JobStatus::Fired);

    let result = job.mark_cancelled(&DefaultClock);
    let expected = Err(SchedulerDomainError::AlreadySettled {
        job_id: job.id(),
        status: JobStatus::Fired,
    });
    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }

    let fired_again = job.mark_fired(&DefaultClock);
    ensure!(fired_again == expected);
    Ok(())
}

#[rstest]
fn record_failure_keeps_the_job_pending(mut job: DelayedJob) -> eyre::Result<()> {
    let next_fire_at = job.fire_at() + Duration::seconds(30);
    job.record_failure("notifier unreachable", next_fire_at, &DefaultClock)?;
    ensure!(job.status() == JobStatus::Pending);
    ensure!(job.attempts() == 1);
    ensure!(job.fire_at() == next_fire_at);
    ensure!(job.last_error() == Some("notifier unreachable"));
    Ok(())
}

#[rstest]
fn cancelled_jobs_stay_cancelled(mut job: DelayedJob) -> eyre::Result<()> {
    job.mark_cancelled(&DefaultClock)?;
    ensure!(job.status() == JobStatus::Cancelled);

    let result = job.record_failure("late failure", Utc::now(), &DefaultClock);
    ensure!(matches!(
        result,
        Err(SchedulerDomainError::AlreadySettled { .. })
    ));
    Ok(())
}
