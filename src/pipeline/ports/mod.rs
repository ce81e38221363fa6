//! Port contracts for the opportunity pipeline.
//!
//! Ports define infrastructure-agnostic interfaces used by pipeline
//! services.

pub mod observer;
pub mod repository;

pub use observer::{ObserverError, TransitionObserver};
pub use repository::{
    OpportunityRepository, OpportunityRepositoryError, OpportunityRepositoryResult,
};
