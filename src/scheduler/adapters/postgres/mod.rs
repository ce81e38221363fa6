//! `PostgreSQL` adapters for the delayed-job scheduler.

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::{PostgresJobStore, SchedulerPgPool};
