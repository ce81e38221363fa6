//! Opportunity pipeline for Dealflow.
//!
//! This module implements the sales side of the engine: opening
//! opportunities, validating and applying stage transitions against the
//! configurable stage catalog, keeping the append-only stage history in
//! lockstep with the entity, and emitting transition events to registered
//! observers (the trial expiry coordinator among them). The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
