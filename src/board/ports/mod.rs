//! Port contracts for the implementation board.
//!
//! Ports define infrastructure-agnostic interfaces used by board
//! services.

pub mod repository;

pub use repository::{BoardRepository, BoardRepositoryError, BoardRepositoryResult};
