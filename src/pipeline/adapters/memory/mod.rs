//! In-memory adapters for the opportunity pipeline.

mod opportunity;

pub use opportunity::InMemoryOpportunityRepository;
