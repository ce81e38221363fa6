//! `PostgreSQL` adapters for the implementation board.

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::{BoardPgPool, PostgresBoardRepository};
