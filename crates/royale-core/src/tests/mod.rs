//! Cross-module tests.
//!
//! - `determinism.rs`: Same seed and roster produce identical matches,
//!   stages and analysis reports
//! - `integration.rs`: End-to-end match and season scenarios
//! - `helpers.rs`: Lobby and season factories

mod determinism;
mod helpers;
mod integration;
