//! Application services for the delayed-job scheduler.

mod scheduler;

pub use scheduler::{
    DelayedJobScheduler, DispatchReport, JobHandle, SchedulerServiceError, SchedulerServiceResult,
};
