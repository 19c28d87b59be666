//! End-to-end match and season scenarios.
//!
//! These tests drive the public engines the way a presentation layer would:
//! - Full matches: survivor schedule, placement and point totals
//! - Encounters: uniqueness within a round, contested drops
//! - Seasons: qualification cut-offs, persistence, a whole season loop

use std::collections::BTreeSet;

use dropzone::Round;

use crate::config::SeasonConfig;
use crate::match_engine::MatchEngine;
use crate::output::{MatchStep, TournamentStep};
use crate::store::{MemoryStore, Store, KEY_CALENDAR, KEY_TOURNAMENT_STATE};
use crate::team::TeamId;
use crate::tournament::{
    CalendarDate, NextEvent, Qualifications, Stage, StagePhase, TournamentEngine,
    TournamentState,
};

use super::helpers::{equal_lobby, player_lobby, run_match, season, season_from_state};

// =============================================================================
// Matches
// =============================================================================

#[test]
fn twenty_team_match_crowns_one_survivor() {
    let outcome = run_match(equal_lobby(20, 50.0), 2024);

    assert_eq!(outcome.rounds.len(), Round::COUNT);
    assert_eq!(outcome.rows.len(), 20);
    let survivors: Vec<_> = outcome
        .rows
        .iter()
        .filter(|r| r.eliminated_round.is_none())
        .collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].place, 1);

    let placement: u32 = outcome.rows.iter().map(|r| r.placement_points).sum();
    assert_eq!(placement, 43);
}

#[test]
fn survivor_schedule_holds_across_seeds() {
    for seed in 0..40 {
        let outcome = run_match(player_lobby(20, 50.0), seed);
        let alive: Vec<usize> = outcome.rounds.iter().map(|r| r.alive_after).collect();
        assert_eq!(alive, vec![16, 12, 8, 4, 2, 1], "seed {seed}");
    }
}

#[test]
fn places_are_a_permutation() {
    for seed in 0..20 {
        let outcome = run_match(player_lobby(20, 60.0), seed);
        let places: BTreeSet<usize> = outcome.rows.iter().map(|r| r.place).collect();
        assert_eq!(places, (1..=20).collect::<BTreeSet<_>>(), "seed {seed}");
        for pair in outcome.rows.windows(2) {
            assert!(pair[0].place < pair[1].place);
        }
    }
}

#[test]
fn row_totals_add_up() {
    let outcome = run_match(player_lobby(20, 50.0), 8);
    for row in &outcome.rows {
        assert_eq!(
            row.total,
            row.placement_points
                + row.kill_points
                + row.assist_points
                + row.treasure_points
                + row.flag_points
        );
    }
}

#[test]
fn eliminated_teams_have_no_one_alive() {
    let outcome = run_match(player_lobby(20, 50.0), 99);
    for snapshot in &outcome.teams {
        if snapshot.eliminated_round.is_some() {
            assert_eq!(snapshot.alive, 0, "{}", snapshot.name);
        } else {
            assert!(snapshot.alive > 0, "{}", snapshot.name);
        }
    }
}

#[test]
fn eliminated_round_matches_report() {
    let outcome = run_match(player_lobby(20, 50.0), 12);
    for report in &outcome.rounds {
        for id in &report.eliminated {
            let row = outcome.rows.iter().find(|r| r.team_id == *id).unwrap();
            assert_eq!(row.eliminated_round, Some(report.round));
        }
    }
}

// =============================================================================
// Encounters
// =============================================================================

#[test]
fn teams_fight_once_per_round_outside_fallbacks() {
    for seed in 0..30 {
        let outcome = run_match(player_lobby(20, 50.0), seed);
        for report in &outcome.rounds {
            let mut seen = BTreeSet::new();
            for encounter in report.encounters.iter().filter(|e| !e.fallback) {
                assert_ne!(encounter.team_a, encounter.team_b);
                assert!(seen.insert(encounter.team_a), "seed {seed}");
                assert!(seen.insert(encounter.team_b), "seed {seed}");
            }
        }
    }
}

#[test]
fn contested_player_fights_in_round_one() {
    let mut checked = 0;
    for seed in 0..60 {
        let mut engine = MatchEngine::new(player_lobby(20, 50.0), seed);
        engine.step();
        let MatchStep::Dropped {
            contested_areas,
            player_contested,
            ..
        } = engine.step().step
        else {
            panic!("second step is the drop");
        };
        // the round-one pool is smaller than the lobby
        assert!(!contested_areas.is_empty());
        let MatchStep::RoundResolved(report) = engine.step().step else {
            panic!("third step is round one");
        };
        if player_contested {
            assert!(report.player_fought(), "seed {seed}");
            checked += 1;
        }
    }
    assert!(checked > 0);
}

// =============================================================================
// Qualification
// =============================================================================

fn national_state() -> TournamentState {
    TournamentState {
        stage: Stage::National,
        qualifications: Qualifications::NATIONAL,
        ..TournamentState::default()
    }
}

/// 40 ids with the player at `player_rank`.
fn ranking_with_player_at(player_rank: usize) -> Vec<TeamId> {
    let mut ids: Vec<TeamId> = (1..40).map(TeamId::new).collect();
    ids.insert(player_rank - 1, TeamId::PLAYER);
    ids
}

#[test]
fn ninth_at_national_goes_to_last_chance() {
    let mut state = national_state();
    let verdict = state.apply_stage_result(
        StagePhase::National,
        &ranking_with_player_at(9),
        &SeasonConfig::default(),
    );

    assert_eq!(verdict.player_rank, Some(9));
    assert_eq!(verdict.flags_earned, Qualifications::LAST_CHANCE);
    assert!(state.qualifications.contains(Qualifications::LAST_CHANCE));
    assert!(!state.qualifications.contains(Qualifications::WORLD));
    assert_eq!(state.stage, Stage::LastChance);
    assert_eq!(state.last_chance_ids.len(), 20);
    assert_eq!(state.last_chance_ids[0], TeamId::PLAYER);
    assert_eq!(state.world_ids.len(), 8);

    assert!(state.can_enter(StagePhase::LastChance).is_ok());
    assert!(state.can_enter(StagePhase::WorldQual).is_err());
}

#[test]
fn last_chance_runs_from_resumed_state() {
    let mut state = national_state();
    state.apply_stage_result(
        StagePhase::National,
        &ranking_with_player_at(9),
        &SeasonConfig::default(),
    );

    let mut engine = season_from_state(&state, 5);
    assert_eq!(engine.state(), &state);
    let verdict = engine.run_stage(StagePhase::LastChance).unwrap();
    assert_eq!(verdict.phase, StagePhase::LastChance);
    assert!(verdict.player_rank.is_some());
    // world gets two more teams either way
    assert_eq!(engine.state().world_ids.len(), 10);
    if verdict.player_rank <= Some(2) {
        assert_eq!(engine.state().stage, Stage::World);
    } else {
        assert!(engine.state().is_over());
    }
}

#[test]
fn direct_qualifier_skips_last_chance() {
    let mut state = national_state();
    let verdict = state.apply_stage_result(
        StagePhase::National,
        &ranking_with_player_at(3),
        &SeasonConfig::default(),
    );
    assert_eq!(verdict.flags_earned, Qualifications::WORLD);
    assert_eq!(state.stage, Stage::World);
    assert_eq!(state.world_ids.len(), 10);
    assert!(state.can_enter(StagePhase::LastChance).is_err());
    assert!(state.can_enter(StagePhase::WorldQual).is_ok());
}

// =============================================================================
// Seasons
// =============================================================================

/// Drives `engine` week by week until the player's season ends.
fn play_season(engine: &mut TournamentEngine<MemoryStore>) -> Vec<StagePhase> {
    let mut played = Vec::new();
    for _ in 0..120 {
        if engine.state().is_over() {
            break;
        }
        match engine.begin_due_stage().unwrap() {
            Some(started) => {
                let phase = started.phase.unwrap();
                loop {
                    if let TournamentStep::StageComplete { persisted, .. } =
                        engine.step().unwrap().step
                    {
                        assert!(persisted.is_persisted());
                        break;
                    }
                }
                played.push(phase);
            }
            None => {
                engine.advance_week().unwrap();
            }
        }
    }
    played
}

#[test]
fn season_runs_to_completion() {
    for seed in [1, 2, 3] {
        let mut engine = season(seed);
        let played = play_season(&mut engine);

        assert!(engine.state().is_over(), "seed {seed}");
        assert_eq!(played[0], StagePhase::Local);
        let mut sorted = played.clone();
        sorted.sort();
        assert_eq!(played, sorted, "stages run in ladder order");
        assert_eq!(engine.next_event(), NextEvent::Undetermined);

        let stored: TournamentState = serde_json::from_value(
            engine.store().get(KEY_TOURNAMENT_STATE).unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(&stored, engine.state());

        let calendar: CalendarDate =
            serde_json::from_value(engine.store().get(KEY_CALENDAR).unwrap().unwrap()).unwrap();
        assert_eq!(calendar, engine.calendar());
    }
}

#[test]
fn resumed_season_continues_from_store() {
    let mut first = season(4);
    first.run_stage(StagePhase::Local).unwrap();

    let store = first.store().clone();
    let resumed = TournamentEngine::new(
        SeasonConfig::default(),
        crate::catalog::Catalog::builtin(),
        store,
        4,
    )
    .unwrap();
    assert_eq!(resumed.state(), first.state());
    assert_eq!(resumed.gold(), first.gold());
}

#[test]
fn new_season_keeps_org_rank() {
    let mut engine = season(6);
    play_season(&mut engine);
    let org_rank = engine.state().org_rank;

    engine.start_new_season().unwrap();
    assert_eq!(engine.state().season, 2);
    assert_eq!(engine.state().org_rank, org_rank);
    assert_eq!(engine.state().stage, Stage::Local);
    assert!(engine.state().qualifications.is_empty());
}
