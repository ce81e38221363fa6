//! `PostgreSQL` adapters for the opportunity pipeline.

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::{PipelinePgPool, PostgresOpportunityRepository};
