//! Delayed-job scheduler for Dealflow.
//!
//! A generic at-least-once delayed-job queue: jobs are enqueued under a
//! (key, name) pair with supersede semantics, fire at or after a target
//! time, and are processed by handlers registered once at startup.
//! Handler failures retry with backoff; duplicate deliveries are possible
//! and handlers must be idempotent. The module follows hexagonal
//! architecture:
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
