//! Port contracts for the delayed-job scheduler.
//!
//! Ports define infrastructure-agnostic interfaces used by the scheduler
//! service.

pub mod handler;
pub mod store;

pub use handler::{JobHandler, JobHandlerError};
pub use store::{JobStore, JobStoreError, JobStoreResult};
