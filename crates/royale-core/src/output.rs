//! Step results emitted to the presentation layer.
//!
//! Engines advance one discrete step per call and return a [`StepResult`]:
//! the step's payload, the phase the engine is now in, and whether it is
//! waiting for another external advance. Every payload is a serializable,
//! read-only snapshot; nothing here borrows engine state, so a renderer can
//! hold on to a step for as long as it likes without blocking the engines.
//!
//! # Architecture
//!
//! - [`MatchStep`]: One transition of the match state machine
//!   (`Init → Drop → Round(1..=6) → Result → Done`)
//! - [`TournamentStep`]: One transition of a season stage (stage start, one
//!   lobby played, one bracket series played, stage complete)
//! - [`TeamSnapshot`]: Read-only team state for banners and lists
//!
//! # Example
//!
//! ```
//! use royale_core::match_engine::MatchEngine;
//! use royale_core::output::{MatchPhase, MatchStep};
//! use royale_core::team::{Team, TeamId};
//!
//! let teams = (1..=20).map(|i| Team::new(TeamId::new(i), format!("T{i}"), 50.0)).collect();
//! let mut engine = MatchEngine::new(teams, 7);
//!
//! let first = engine.step();
//! assert!(matches!(first.step, MatchStep::Initialized { teams: 20 }));
//! assert_eq!(first.phase, MatchPhase::Drop);
//! assert!(first.awaiting_advance);
//! ```

use std::fmt;

use dropzone::{AreaId, DropPlacement, Round};
use serde::{Deserialize, Serialize};

use crate::battle::BattleOutcome;
use crate::encounter::Encounter;
use crate::event::EventOutcome;
use crate::scoring::{MatchRow, RankedStanding};
use crate::store::PersistOutcome;
use crate::team::{Team, TeamId};
use crate::tournament::{StagePhase, StageVerdict};

// =============================================================================
// Generic Step Envelope
// =============================================================================

/// One engine step plus the driver signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult<S, P> {
    /// What happened in this step.
    pub step: S,
    /// Phase the engine is in after the step.
    pub phase: P,
    /// Whether the engine expects another `step` call.
    pub awaiting_advance: bool,
}

// =============================================================================
// Match Steps
// =============================================================================

/// Match state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "round", rename_all = "snake_case")]
pub enum MatchPhase {
    /// Transient fields not yet reset.
    Init,
    /// Waiting for the initial drop.
    Drop,
    /// Waiting to resolve the given round.
    Round(Round),
    /// All rounds resolved; waiting for scoring.
    Result,
    /// Scored.
    Done,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Drop => write!(f, "drop"),
            Self::Round(round) => write!(f, "round {}", round.get()),
            Self::Result => write!(f, "result"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Read-only view of one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    /// Team identifier.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Whether this is the player's team.
    pub is_player: bool,
    /// Current area.
    pub area: Option<AreaId>,
    /// Members standing.
    pub alive: u8,
    /// Elimination round, if eliminated.
    pub eliminated_round: Option<Round>,
    /// Kills this match.
    pub kills_total: u32,
    /// Assists this match.
    pub assists_total: u32,
    /// Treasure this match.
    pub treasure: u32,
    /// Flags this match.
    pub flag: u32,
}

impl From<&Team> for TeamSnapshot {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            is_player: team.is_player,
            area: team.area,
            alive: team.alive(),
            eliminated_round: team.eliminated_round(),
            kills_total: team.kills_total,
            assists_total: team.assists_total,
            treasure: team.treasure,
            flag: team.flag,
        }
    }
}

/// Everything that happened in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// The round.
    pub round: Round,
    /// Events rolled this round, in roll order.
    pub events: Vec<EventOutcome>,
    /// Encounters built this round.
    pub encounters: Vec<Encounter>,
    /// Resolved battles, in encounter order. Fallback encounters whose
    /// reused team was already out produce no battle.
    pub battles: Vec<BattleOutcome>,
    /// Teams eliminated this round.
    pub eliminated: Vec<TeamId>,
    /// Teams alive after the round.
    pub alive_after: usize,
}

impl RoundReport {
    /// Whether the player's team fought this round.
    #[must_use]
    pub fn player_fought(&self) -> bool {
        self.encounters.iter().any(|e| e.involves_player)
    }
}

/// One transition of the match state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchStep {
    /// Transient fields were reset.
    Initialized {
        /// Teams in the lobby.
        teams: usize,
    },
    /// Teams were dropped on the map.
    Dropped {
        /// Landing spot of every team.
        placements: Vec<DropPlacement<TeamId>>,
        /// Areas holding two or more teams.
        contested_areas: Vec<AreaId>,
        /// Whether the player's area was contested.
        player_contested: bool,
    },
    /// One round was resolved.
    RoundResolved(RoundReport),
    /// Places and points were assigned.
    Scored {
        /// Result rows in place order.
        rows: Vec<MatchRow>,
    },
    /// The match is over; further steps are no-ops.
    Finished,
}

/// Full record of a match run to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Seed the match ran with.
    pub seed: u64,
    /// Result rows in place order.
    pub rows: Vec<MatchRow>,
    /// Round reports in order.
    pub rounds: Vec<RoundReport>,
    /// Final team state.
    pub teams: Vec<TeamSnapshot>,
}

impl MatchOutcome {
    /// The first-place row.
    #[must_use]
    pub fn winner(&self) -> Option<&MatchRow> {
        self.rows.first()
    }

    /// The player's row, if the player took part.
    #[must_use]
    pub fn player_row(&self) -> Option<&MatchRow> {
        self.rows.iter().find(|r| r.is_player)
    }
}

// =============================================================================
// Tournament Steps
// =============================================================================

/// One transition of a season stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TournamentStep {
    /// A stage roster was built.
    StageStarted {
        /// Stage.
        phase: StagePhase,
        /// Participating teams.
        roster: Vec<TeamId>,
        /// Lobbies (or bracket series) scheduled.
        scheduled: usize,
    },
    /// One lobby was played.
    MatchPlayed {
        /// Stage.
        phase: StagePhase,
        /// 1-based lobby number within the stage.
        match_number: usize,
        /// Lobby label, e.g. `"A+B"` for grouped stages.
        lobby: Option<String>,
        /// Seed of the match.
        seed: u64,
        /// Result rows.
        rows: Vec<MatchRow>,
        /// Stage standings after the match.
        standings: Vec<RankedStanding>,
    },
    /// One bracket series was played.
    SeriesPlayed {
        /// Stage.
        phase: StagePhase,
        /// Bracket round label.
        bracket_round: String,
        /// Higher seed.
        team_a: TeamId,
        /// Lower seed.
        team_b: TeamId,
        /// Duels won by `team_a`.
        wins_a: u32,
        /// Duels won by `team_b`.
        wins_b: u32,
        /// Series winner.
        winner: TeamId,
    },
    /// The stage finished and its verdict was applied.
    StageComplete {
        /// Final standings (bracket order for the championship).
        standings: Vec<RankedStanding>,
        /// Qualification verdict.
        verdict: StageVerdict,
        /// Whether the new season state reached the store.
        persisted: PersistOutcome,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(MatchPhase::Round(Round::THREE).to_string(), "round 3");
        assert_eq!(MatchPhase::Done.to_string(), "done");
    }

    #[test]
    fn snapshot_copies_team_state() {
        let mut team = Team::new(TeamId::new(3), "Three", 50.0).as_player();
        team.kills_total = 2;
        team.eliminate(Round::FOUR);
        let snap = TeamSnapshot::from(&team);
        assert!(snap.is_player);
        assert_eq!(snap.alive, 0);
        assert_eq!(snap.eliminated_round, Some(Round::FOUR));
        assert_eq!(snap.kills_total, 2);
    }

    #[test]
    fn steps_serialize_with_kind_tag() {
        let step = MatchStep::Initialized { teams: 20 };
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"{"kind":"initialized","teams":20}"#);

        let phase = serde_json::to_string(&MatchPhase::Round(Round::TWO)).unwrap();
        assert_eq!(phase, r#"{"phase":"round","round":2}"#);
        let back: MatchPhase = serde_json::from_str(&phase).unwrap();
        assert_eq!(back, MatchPhase::Round(Round::TWO));
    }
}
