//! Test helper functions for building lobbies and seasons.

use crate::catalog::Catalog;
use crate::config::SeasonConfig;
use crate::match_engine::MatchEngine;
use crate::output::{MatchOutcome, MatchStep};
use crate::store::{MemoryStore, Store, KEY_TOURNAMENT_STATE};
use crate::team::{Member, Role, Team, TeamId};
use crate::tournament::{TournamentEngine, TournamentState};

// =============================================================================
// Lobbies
// =============================================================================

/// Creates `n` catalog-style teams with ids `1..=n`, full squads and equal
/// base power.
pub fn equal_lobby(n: u32, power: f64) -> Vec<Team> {
    (1..=n)
        .map(|i| {
            Team::new(TeamId::new(i), format!("Team {i}"), power).with_members(squad(i))
        })
        .collect()
}

/// Like [`equal_lobby`], with the first team replaced by the player.
pub fn player_lobby(n: u32, power: f64) -> Vec<Team> {
    let mut teams = equal_lobby(n.saturating_sub(1), power);
    teams.insert(
        0,
        Team::new(TeamId::PLAYER, "Player", power)
            .with_members(squad(0))
            .as_player(),
    );
    teams
}

/// Attacker, IGL and Support named after the team number.
pub fn squad(i: u32) -> Vec<Member> {
    vec![
        Member::new(Role::Attacker, format!("atk-{i}")),
        Member::new(Role::Igl, format!("igl-{i}")),
        Member::new(Role::Support, format!("sup-{i}")),
    ]
}

/// Runs a match to completion.
pub fn run_match(teams: Vec<Team>, seed: u64) -> MatchOutcome {
    MatchEngine::new(teams, seed).run()
}

/// Steps a match to completion, collecting every step.
pub fn collect_steps(teams: Vec<Team>, seed: u64) -> Vec<MatchStep> {
    let mut engine = MatchEngine::new(teams, seed);
    let mut steps = Vec::new();
    while !engine.is_done() {
        steps.push(engine.step().step);
    }
    steps
}

// =============================================================================
// Seasons
// =============================================================================

/// A season engine over an in-memory store.
pub fn season(seed: u64) -> TournamentEngine<MemoryStore> {
    season_with_store(MemoryStore::new(), seed)
}

/// A season engine over `store`.
pub fn season_with_store(store: MemoryStore, seed: u64) -> TournamentEngine<MemoryStore> {
    TournamentEngine::new(SeasonConfig::default(), Catalog::builtin(), store, seed)
        .expect("builtin catalog and default config are valid")
}

/// A season engine that resumes from `state`.
pub fn season_from_state(state: &TournamentState, seed: u64) -> TournamentEngine<MemoryStore> {
    let mut store = MemoryStore::new();
    store
        .set(
            KEY_TOURNAMENT_STATE,
            serde_json::to_value(state).expect("state serializes"),
        )
        .expect("memory store is online");
    season_with_store(store, seed)
}
