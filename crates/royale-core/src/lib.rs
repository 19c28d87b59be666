//! # Royale Core
//!
//! Battle-royale season simulation core.
//!
//! This crate runs 20-team, six-round elimination matches and the season
//! ladder built on top of them. It is headless: presentation layers drive it
//! one step at a time and read snapshots back.
//!
//! ## Architecture
//!
//! - **Match**: [`power`] → [`event`] → [`encounter`] → [`battle`], sequenced
//!   per round by [`match_engine::MatchEngine`] and ranked by [`scoring`]
//! - **Season**: [`tournament::TournamentEngine`] builds stage rosters, runs
//!   lobbies or bracket series, applies qualification cut-offs and persists
//!   the [`tournament::TournamentState`] through a [`store::Store`]
//! - **Data**: [`team`], [`catalog`], [`config`]
//! - **Tooling**: [`hash`] fingerprints for replays, [`analysis`] Monte Carlo
//!   placement runs, [`logging`] subscriber setup for binaries
//!
//! Map areas, rounds and seeded randomness come from the [`dropzone`] crate.
//!
//! ## Usage
//!
//! ```
//! use royale_core::{MatchEngine, Team, TeamId};
//!
//! let teams = (1..=20).map(|i| Team::new(TeamId::new(i), format!("T{i}"), 50.0)).collect();
//! let outcome = MatchEngine::new(teams, 2024).run();
//!
//! assert_eq!(outcome.rows.len(), 20);
//! assert_eq!(outcome.rows.iter().filter(|r| r.eliminated_round.is_none()).count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export the map and randomness substrate
pub use dropzone;

pub mod analysis;
pub mod battle;
pub mod catalog;
pub mod config;
pub mod encounter;
pub mod error;
pub mod event;
pub mod hash;
pub mod logging;
pub mod match_engine;
pub mod output;
pub mod power;
pub mod scoring;
pub mod store;
pub mod team;
pub mod tournament;

#[cfg(test)]
mod tests;

pub use catalog::Catalog;
pub use config::{MatchConfig, SeasonConfig};
pub use error::{RoyaleError, StageError};
pub use match_engine::MatchEngine;
pub use output::{MatchOutcome, MatchPhase, MatchStep, StepResult, TournamentStep};
pub use scoring::{MatchRow, PointCurve, Standings};
pub use store::{JsonFileStore, MemoryStore, Store};
pub use team::{Team, TeamId};
pub use tournament::{StagePhase, TournamentEngine, TournamentState};
