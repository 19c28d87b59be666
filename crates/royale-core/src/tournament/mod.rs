//! Multi-stage season ladder.
//!
//! # Architecture
//!
//! - [`state`]: The persisted [`TournamentState`], qualification flags and
//!   the cut-off rules (the only code that sets flags)
//! - [`schedule`]: The fixed season calendar and [`next_eligible_event`]
//! - [`roster`]: Stage rosters and grouped lobby plans
//! - [`bracket`]: The championship bracket
//! - [`TournamentEngine`]: Drives stages step by step and persists results
//!
//! ```text
//! Local ─► National ─┬─────────────► World Qual ─┬──────────► World Final ─► Championship
//!                    └► Last-Chance ─┘           └► Losers ─┘
//! ```

pub mod bracket;
mod engine;
pub mod roster;
pub mod schedule;
pub mod state;

pub use engine::{TournamentEngine, TournamentStepResult};
pub use roster::Lobby;
pub use schedule::{due_phase, next_eligible_event, CalendarSlot, NextEvent, SEASON_CALENDAR};
pub use state::{
    CalendarDate, PlayerProfile, Qualifications, Stage, StagePhase, StageVerdict,
    TournamentState, WorldPhase,
};
