//! Fantasy league ledger sync.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod api;
pub mod engine;
pub mod storage;
