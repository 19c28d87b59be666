//! Headless season driver.
//!
//! Plays the player's season week by week against a JSON file store, logging
//! every stage and its verdict. Run it again to continue where the store left
//! off; a finished season rolls over into the next one.
//!
//! ```text
//! season [STORE] [--config PATH] [--catalog PATH] [--seed N] [-v|-vv]
//! ```
//!
//! Without `STORE` the season runs in memory and nothing is kept. Logging
//! defaults to `info`; `-v` is `debug` and `-vv` is `trace`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use royale_core::logging::init_logging;
use royale_core::tournament::NextEvent;
use royale_core::{
    Catalog, JsonFileStore, MemoryStore, SeasonConfig, Store, TournamentEngine, TournamentStep,
};
use tracing::info;

/// Weeks in a year; a season never needs more than one.
const MAX_WEEKS: usize = 48;

/// Plays the player's season against a JSON save file.
#[derive(Debug, Parser)]
#[command(name = "season", version, about, long_about = None)]
struct Args {
    /// Save file; the season runs in memory when omitted.
    store: Option<PathBuf>,

    /// Season config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Team catalog JSON.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Master seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose.saturating_add(1));

    let config = match &args.config {
        Some(path) => SeasonConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SeasonConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::builtin(),
    };

    match &args.store {
        Some(path) => {
            info!(store = %path.display(), "using file store");
            let engine = TournamentEngine::new(config, catalog, JsonFileStore::new(path), args.seed)?;
            play(engine)
        }
        None => {
            let engine = TournamentEngine::new(config, catalog, MemoryStore::new(), args.seed)?;
            play(engine)
        }
    }
}

fn play<S: Store>(mut engine: TournamentEngine<S>) -> Result<()> {
    if engine.load_report().store_unavailable() {
        tracing::warn!("store unavailable at load; progress will not be saved");
    }
    if engine.state().is_over() {
        engine.start_new_season()?;
    }
    info!(
        season = engine.state().season,
        calendar = %engine.calendar(),
        org_rank = engine.state().org_rank,
        "season loaded"
    );

    for _ in 0..=MAX_WEEKS {
        if engine.state().is_over() {
            break;
        }
        match engine.next_event() {
            NextEvent::Undetermined => break,
            NextEvent::Scheduled {
                name, weeks_until, ..
            } if weeks_until > 0 => {
                info!(next = %name, weeks_until, "advancing");
                for _ in 0..weeks_until {
                    engine.advance_week()?;
                }
                continue;
            }
            NextEvent::Scheduled { .. } => {}
        }

        let Some(started) = engine.begin_due_stage()? else {
            engine.advance_week()?;
            continue;
        };
        if let TournamentStep::StageStarted {
            phase, scheduled, ..
        } = &started.step
        {
            info!(stage = phase.title(), scheduled, "stage started");
        }

        loop {
            match engine.step()?.step {
                TournamentStep::MatchPlayed {
                    match_number,
                    lobby,
                    rows,
                    ..
                } => {
                    let player = rows.iter().find(|r| r.is_player);
                    info!(
                        match_number,
                        lobby = lobby.as_deref().unwrap_or("-"),
                        winner = rows.first().map_or("-", |r| r.team_name.as_str()),
                        player_place = ?player.map(|r| r.place),
                        "match played"
                    );
                }
                TournamentStep::SeriesPlayed {
                    bracket_round,
                    team_a,
                    team_b,
                    wins_a,
                    wins_b,
                    winner,
                    ..
                } => {
                    info!(%bracket_round, %team_a, %team_b, wins_a, wins_b, %winner, "series played");
                }
                TournamentStep::StageComplete {
                    verdict, persisted, ..
                } => {
                    info!(
                        stage = verdict.phase.title(),
                        player_rank = ?verdict.player_rank,
                        earned = ?verdict.flags_earned,
                        prize_gold = verdict.prize_gold,
                        org_rank = verdict.org_rank,
                        persisted = persisted.is_persisted(),
                        "stage complete"
                    );
                    break;
                }
                TournamentStep::StageStarted { .. } => bail!("stage restarted mid-run"),
            }
        }
    }

    info!(
        season = engine.state().season,
        over = engine.state().is_over(),
        gold = engine.gold(),
        org_rank = engine.state().org_rank,
        champion = ?engine.state().champion,
        "season finished"
    );
    Ok(())
}
