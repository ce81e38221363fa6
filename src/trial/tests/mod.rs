//! Unit tests for trial expiry coordination.
//!
//! Tests are organised by concern: the coordinator's scheduling intents
//! and the job handlers' idempotence.

mod handler_tests;
