//! Per-match state machine.
//!
//! `MatchEngine` owns the teams of one lobby for the duration of a match and
//! advances through
//!
//! ```text
//! Init → Drop → Round(1) → … → Round(6) → Result → Done
//! ```
//!
//! one transition per [`MatchEngine::step`] call. Each round runs, in order:
//!
//! 1. the event engine,
//! 2. the encounter builder,
//! 3. the battle resolver for every encounter,
//! 4. relocation of surviving teams into the next round's pool (rounds 1–5).
//!
//! All six rounds always run, even when a single team is left standing; a
//! round with nothing to resolve simply reports no battles.
//!
//! # Determinism
//!
//! Teams are held in id order and every random draw flows through one
//! [`SimRng`] seeded at construction, so a seed and a roster fully determine
//! the match.
//!
//! # Malformed Entries
//!
//! Roster entries with an empty name or a duplicate id are dropped at
//! construction and logged; the match runs with the remaining teams.

use dropzone::{AreaMap, Round, SimRng};
use tracing::{debug, warn};

use crate::battle::BattleResolver;
use crate::config::MatchConfig;
use crate::encounter::EncounterBuilder;
use crate::event::{EventEngine, EventTable};
use crate::output::{MatchOutcome, MatchPhase, MatchStep, RoundReport, StepResult, TeamSnapshot};
use crate::scoring::{self, MatchRow, PointCurve, TieBreakHistory};
use crate::team::{Team, TeamId};

/// Step result of the match engine.
pub type MatchStepResult = StepResult<MatchStep, MatchPhase>;

/// The per-match state machine.
///
/// # Example
///
/// ```
/// use royale_core::match_engine::MatchEngine;
/// use royale_core::team::{Team, TeamId};
///
/// let teams = (1..=20).map(|i| Team::new(TeamId::new(i), format!("T{i}"), 50.0)).collect();
/// let outcome = MatchEngine::new(teams, 42).run();
///
/// assert_eq!(outcome.rows.len(), 20);
/// assert_eq!(outcome.rounds.len(), 6);
/// assert_eq!(outcome.rows[0].place, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MatchEngine {
    teams: Vec<Team>,
    skipped: Vec<TeamId>,
    rng: SimRng,
    config: MatchConfig,
    curve: PointCurve,
    history: TieBreakHistory,
    map: AreaMap,
    events: EventEngine,
    encounters: EncounterBuilder,
    resolver: BattleResolver,
    phase: MatchPhase,
    player_contested: bool,
    rounds: Vec<RoundReport>,
    rows: Vec<MatchRow>,
}

impl MatchEngine {
    /// Creates a match over `teams` seeded with `seed`.
    ///
    /// Defaults: [`MatchConfig::default`], the standard point curve, no
    /// tie-break history, the standard map and event table.
    #[must_use]
    pub fn new(teams: Vec<Team>, seed: u64) -> Self {
        Self::with_rng(teams, SimRng::seeded(seed))
    }

    /// Creates a match that draws from an existing generator.
    #[must_use]
    pub fn with_rng(teams: Vec<Team>, rng: SimRng) -> Self {
        let (teams, skipped) = sanitize_roster(teams);
        let config = MatchConfig::default();
        Self {
            teams,
            skipped,
            rng,
            events: EventEngine::new(EventTable::standard(), config.buff_limit_pct),
            encounters: EncounterBuilder::new(&config),
            resolver: BattleResolver::new(&config),
            config,
            curve: PointCurve::Standard,
            history: TieBreakHistory::new(),
            map: AreaMap::standard(),
            phase: MatchPhase::Init,
            player_contested: false,
            rounds: Vec::with_capacity(Round::COUNT),
            rows: Vec::new(),
        }
    }

    /// Replaces the match configuration.
    #[must_use]
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.encounters = EncounterBuilder::new(&config);
        self.resolver = BattleResolver::new(&config);
        self.events = EventEngine::new(self.events.table().clone(), config.buff_limit_pct);
        self.config = config;
        self
    }

    /// Sets the placement-point curve.
    #[must_use]
    pub fn with_curve(mut self, curve: PointCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Sets the stage's tie-break history.
    #[must_use]
    pub fn with_history(mut self, history: TieBreakHistory) -> Self {
        self.history = history;
        self
    }

    /// Sets the area map.
    #[must_use]
    pub fn with_map(mut self, map: AreaMap) -> Self {
        self.map = map;
        self
    }

    /// Sets the event pool.
    #[must_use]
    pub fn with_event_table(mut self, table: EventTable) -> Self {
        self.events = EventEngine::new(table, self.config.buff_limit_pct);
        self
    }

    /// Seed of the match RNG.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Whether the match has been scored.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.phase == MatchPhase::Done
    }

    /// Teams in id order.
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Ids of roster entries dropped as malformed.
    #[must_use]
    pub fn skipped(&self) -> &[TeamId] {
        &self.skipped
    }

    /// Read-only snapshot of every team.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TeamSnapshot> {
        self.teams.iter().map(TeamSnapshot::from).collect()
    }

    /// Teams still in the match.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.teams.iter().filter(|t| t.is_alive()).count()
    }

    /// Result rows; empty until the match is scored.
    #[must_use]
    pub fn rows(&self) -> &[MatchRow] {
        &self.rows
    }

    /// Round reports so far.
    #[must_use]
    pub fn rounds(&self) -> &[RoundReport] {
        &self.rounds
    }

    /// Advances the state machine by one transition.
    ///
    /// Calling `step` after the match is done returns
    /// [`MatchStep::Finished`] and changes nothing.
    pub fn step(&mut self) -> MatchStepResult {
        let step = match self.phase {
            MatchPhase::Init => self.init(),
            MatchPhase::Drop => self.drop_teams(),
            MatchPhase::Round(round) => self.play_round(round),
            MatchPhase::Result => self.score(),
            MatchPhase::Done => MatchStep::Finished,
        };
        StepResult {
            step,
            phase: self.phase,
            awaiting_advance: self.phase != MatchPhase::Done,
        }
    }

    /// Steps until the match is done and returns the full record.
    pub fn run(&mut self) -> MatchOutcome {
        while !self.is_done() {
            self.step();
        }
        MatchOutcome {
            seed: self.seed(),
            rows: self.rows.clone(),
            rounds: self.rounds.clone(),
            teams: self.snapshot(),
        }
    }

    /// Consumes the engine and returns its teams (after the match, these
    /// carry the final per-match stat lines).
    #[must_use]
    pub fn into_teams(self) -> Vec<Team> {
        self.teams
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    fn init(&mut self) -> MatchStep {
        for team in &mut self.teams {
            team.reset_for_match();
        }
        self.rounds.clear();
        self.rows.clear();
        self.player_contested = false;
        self.phase = MatchPhase::Drop;
        MatchStep::Initialized {
            teams: self.teams.len(),
        }
    }

    fn drop_teams(&mut self) -> MatchStep {
        let ids: Vec<TeamId> = self.teams.iter().map(|t| t.id).collect();
        let placements = self.map.initial_drop(&mut self.rng, &ids);
        for placement in &placements {
            if let Some(team) = self.teams.iter_mut().find(|t| t.id == placement.team) {
                team.area = Some(placement.area);
            }
        }

        let contested = AreaMap::contested_areas(&placements);
        self.player_contested = self
            .teams
            .iter()
            .find(|t| t.is_player)
            .and_then(|t| t.area)
            .is_some_and(|area| contested.contains(&area));
        debug!(
            seed = self.seed(),
            contested = contested.len(),
            player_contested = self.player_contested,
            "teams dropped"
        );

        self.phase = MatchPhase::Round(Round::ONE);
        MatchStep::Dropped {
            placements,
            contested_areas: contested.into_iter().collect(),
            player_contested: self.player_contested,
        }
    }

    fn play_round(&mut self, round: Round) -> MatchStep {
        let events = self.events.roll_round_events(
            &mut self.teams,
            round,
            self.config.events(round),
            &mut self.rng,
        );
        let encounters = self.encounters.build_encounters(
            &self.teams,
            round,
            self.player_contested,
            &mut self.rng,
        );

        let mut battles = Vec::with_capacity(encounters.len());
        for encounter in &encounters {
            let Some((a, b)) = pair_mut(&mut self.teams, encounter.team_a, encounter.team_b) else {
                continue;
            };
            match self.resolver.resolve(a, b, round, &mut self.rng) {
                Some(outcome) => battles.push(outcome),
                None => debug!(
                    round = round.get(),
                    team_a = %encounter.team_a,
                    team_b = %encounter.team_b,
                    "encounter skipped, a side was already out"
                ),
            }
        }

        if let Some(next) = round.next() {
            for team in self.teams.iter_mut().filter(|t| t.is_alive()) {
                team.area = Some(self.map.relocate(&mut self.rng, next));
            }
        }

        let eliminated: Vec<TeamId> = battles.iter().map(|b| b.loser).collect();
        let alive_after = self.alive_count();
        debug!(
            round = round.get(),
            events = events.len(),
            battles = battles.len(),
            alive_after,
            "round resolved"
        );

        self.phase = round.next().map_or(MatchPhase::Result, MatchPhase::Round);
        let report = RoundReport {
            round,
            events,
            encounters,
            battles,
            eliminated,
            alive_after,
        };
        self.rounds.push(report.clone());
        MatchStep::RoundResolved(report)
    }

    fn score(&mut self) -> MatchStep {
        self.rows = scoring::score_match(&self.teams, self.curve, &self.history, &mut self.rng);
        self.phase = MatchPhase::Done;
        MatchStep::Scored {
            rows: self.rows.clone(),
        }
    }
}

/// Drops entries with an empty name or a repeated id and sorts by id.
fn sanitize_roster(teams: Vec<Team>) -> (Vec<Team>, Vec<TeamId>) {
    let mut kept: Vec<Team> = Vec::with_capacity(teams.len());
    let mut skipped = Vec::new();
    for team in teams {
        if team.name.trim().is_empty() {
            warn!(team = %team.id, "skipping roster entry with empty name");
            skipped.push(team.id);
        } else if kept.iter().any(|t| t.id == team.id) {
            warn!(team = %team.id, "skipping roster entry with duplicate id");
            skipped.push(team.id);
        } else {
            kept.push(team);
        }
    }
    kept.sort_by_key(|t| t.id);
    (kept, skipped)
}

/// Mutable references to two distinct teams.
fn pair_mut(teams: &mut [Team], a: TeamId, b: TeamId) -> Option<(&mut Team, &mut Team)> {
    let i = teams.iter().position(|t| t.id == a)?;
    let j = teams.iter().position(|t| t.id == b)?;
    if i == j {
        return None;
    }
    if i < j {
        let (left, right) = teams.split_at_mut(j);
        Some((&mut left[i], &mut right[0]))
    } else {
        let (left, right) = teams.split_at_mut(i);
        Some((&mut right[0], &mut left[j]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> Vec<Team> {
        let mut teams = vec![Team::new(TeamId::PLAYER, "Player", 50.0).as_player()];
        teams.extend((1..20).map(|i| Team::new(TeamId::new(i), format!("T{i}"), 50.0)));
        teams
    }

    mod phase_tests {
        use super::*;

        #[test]
        fn phases_advance_in_order() {
            let mut engine = MatchEngine::new(lobby(), 1);
            let mut phases = vec![engine.phase()];
            while !engine.is_done() {
                phases.push(engine.step().phase);
            }
            let mut expected = vec![MatchPhase::Init, MatchPhase::Drop];
            expected.extend(Round::ALL.iter().map(|r| MatchPhase::Round(*r)));
            expected.extend([MatchPhase::Result, MatchPhase::Done]);
            assert_eq!(phases, expected);
        }

        #[test]
        fn step_after_done_is_a_no_op() {
            let mut engine = MatchEngine::new(lobby(), 2);
            let outcome = engine.run();
            let after = engine.step();
            assert_eq!(after.step, MatchStep::Finished);
            assert!(!after.awaiting_advance);
            assert_eq!(engine.rows(), outcome.rows.as_slice());
        }

        #[test]
        fn drop_places_every_team() {
            let mut engine = MatchEngine::new(lobby(), 3);
            engine.step();
            let result = engine.step();
            let MatchStep::Dropped {
                placements,
                contested_areas,
                ..
            } = result.step
            else {
                panic!("expected drop step");
            };
            assert_eq!(placements.len(), 20);
            assert!(!contested_areas.is_empty());
            assert!(engine.teams().iter().all(|t| t.area.is_some()));
        }

        #[test]
        fn survivors_relocate_into_next_pool() {
            let mut engine = MatchEngine::new(lobby(), 4);
            engine.step();
            engine.step();
            engine.step(); // round 1
            engine.step(); // round 2
            let pool = AreaMap::standard().candidate_areas(Round::THREE).to_vec();
            for team in engine.teams().iter().filter(|t| t.is_alive()) {
                assert!(pool.contains(&team.area.unwrap()));
            }
        }
    }

    mod roster_tests {
        use super::*;

        #[test]
        fn malformed_entries_are_skipped() {
            let mut teams = lobby();
            teams.push(Team::new(TeamId::new(5), "Duplicate", 50.0));
            teams.push(Team::new(TeamId::new(77), "   ", 50.0));
            let mut engine = MatchEngine::new(teams, 5);
            assert_eq!(engine.teams().len(), 20);
            assert_eq!(engine.skipped(), &[TeamId::new(5), TeamId::new(77)]);
            let outcome = engine.run();
            assert_eq!(outcome.rows.len(), 20);
        }

        #[test]
        fn non_finite_power_does_not_halt() {
            let mut teams = lobby();
            teams[3].base_power = f64::NAN;
            teams[4].base_power = f64::INFINITY;
            let outcome = MatchEngine::new(teams, 6).run();
            assert_eq!(outcome.rows.len(), 20);
        }

        #[test]
        fn teams_are_held_in_id_order() {
            let mut teams = lobby();
            teams.reverse();
            let engine = MatchEngine::new(teams, 7);
            let ids: Vec<u32> = engine.teams().iter().map(|t| t.id.as_u32()).collect();
            assert_eq!(ids, (0..20).collect::<Vec<_>>());
        }

        #[test]
        fn pair_mut_rejects_same_team() {
            let mut teams = lobby();
            assert!(pair_mut(&mut teams, TeamId::new(3), TeamId::new(3)).is_none());
            assert!(pair_mut(&mut teams, TeamId::new(3), TeamId::new(99)).is_none());
            let (a, b) = pair_mut(&mut teams, TeamId::new(9), TeamId::new(2)).unwrap();
            assert_eq!((a.id, b.id), (TeamId::new(9), TeamId::new(2)));
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn compact_curve_changes_points() {
            let outcome = MatchEngine::new(lobby(), 8)
                .with_curve(PointCurve::Compact)
                .run();
            let placement: u32 = outcome.rows.iter().map(|r| r.placement_points).sum();
            assert_eq!(placement, 35);
        }

        #[test]
        fn empty_event_table_means_no_events() {
            let outcome = MatchEngine::new(lobby(), 9)
                .with_event_table(EventTable::new(Vec::new()))
                .run();
            assert!(outcome.rounds.iter().all(|r| r.events.is_empty()));
            assert!(outcome.teams.iter().all(|t| t.treasure == 0 && t.flag == 0));
        }

        #[test]
        fn events_follow_round_table() {
            let outcome = MatchEngine::new(lobby(), 10).run();
            let counts: Vec<usize> = outcome.rounds.iter().map(|r| r.events.len()).collect();
            assert_eq!(counts, vec![1, 2, 2, 2, 2, 0]);
        }
    }
}
