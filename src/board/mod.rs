//! Implementation board for Dealflow.
//!
//! This module implements the delivery side of the engine: the Kanban
//! board of implementation tasks. Tasks move `pending` to `scheduled` to a
//! terminal `done` or `unsuccessful`; every status change appends an event
//! to the task's append-only log, and card ordering within a column uses
//! insert-and-shift positioning. The module follows hexagonal
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
