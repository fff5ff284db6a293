//! bankagg — library crate for integration testing.
//!
//! Re-exports modules needed by integration tests in `tests/`.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod consents;
pub mod errors;
pub mod models;
pub mod oauth;
pub mod store;
