//! Season driver: stage rosters, lobbies, brackets and persistence.
//!
//! The engine owns the only mutable [`TournamentState`] of a season and is
//! its only writer. A stage runs as a sequence of [`TournamentEngine::step`]
//! calls, one lobby or one bracket series per call; the final call applies
//! the qualification verdict and persists the new state.
//!
//! ```text
//! begin_stage → MatchPlayed × N (or SeriesPlayed × N) → StageComplete
//! ```
//!
//! # Persistence
//!
//! Keys are loaded once at construction. Missing keys fall back to their
//! defaults. When the store was unavailable at load time nothing is written
//! back for the rest of the session, so a transient outage cannot overwrite
//! a real save with defaults; the in-memory season stays correct and every
//! write reports [`PersistOutcome::Failed`].

use std::collections::BTreeMap;

use dropzone::{AreaMap, SimRng};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::bracket::{self, Bracket};
use super::roster::{self, Lobby};
use super::schedule::{self, NextEvent};
use super::state::{CalendarDate, PlayerProfile, StagePhase, StageVerdict, TournamentState};
use crate::battle::BattleResolver;
use crate::catalog::Catalog;
use crate::config::SeasonConfig;
use crate::error::{RoyaleError, StageError};
use crate::event::EventTable;
use crate::match_engine::MatchEngine;
use crate::output::{StepResult, TournamentStep};
use crate::power::NEUTRAL_BASE_POWER;
use crate::scoring::{PointCurve, RankedStanding, Standings};
use crate::store::{
    LoadReport, LoadStatus, Loaded, PersistOutcome, SeasonStore, Store, KEY_CALENDAR, KEY_GOLD,
    KEY_PLAYER_PROFILE, KEY_TOURNAMENT_STATE,
};
use crate::team::{Team, TeamId};

/// Step result of the tournament engine. The phase is the stage still in
/// progress, `None` once it completes.
pub type TournamentStepResult = StepResult<TournamentStep, Option<StagePhase>>;

/// How the running stage is played.
#[derive(Debug, Clone)]
enum Progress {
    Lobbies {
        lobbies: Vec<Lobby>,
        curve: PointCurve,
        next: usize,
        match_point: Option<u32>,
        decided: Option<TeamId>,
    },
    Bracket {
        bracket: Bracket,
        series_length: u32,
    },
}

/// A stage between `begin_stage` and its `StageComplete` step.
#[derive(Debug, Clone)]
struct ActiveStage {
    phase: StagePhase,
    teams: BTreeMap<TeamId, Team>,
    standings: Standings,
    progress: Progress,
}

/// Multi-stage season engine.
///
/// # Example
///
/// ```
/// use royale_core::catalog::Catalog;
/// use royale_core::config::SeasonConfig;
/// use royale_core::output::TournamentStep;
/// use royale_core::store::MemoryStore;
/// use royale_core::tournament::{StagePhase, TournamentEngine};
///
/// let mut engine =
///     TournamentEngine::new(SeasonConfig::default(), Catalog::builtin(), MemoryStore::new(), 3)
///         .unwrap();
/// let verdict = engine.run_stage(StagePhase::Local).unwrap();
/// assert_eq!(verdict.phase, StagePhase::Local);
/// assert!(engine.active_phase().is_none());
/// ```
#[derive(Debug)]
pub struct TournamentEngine<S> {
    config: SeasonConfig,
    catalog: Catalog,
    map: AreaMap,
    events: EventTable,
    store: SeasonStore<S>,
    rng: SimRng,
    state: TournamentState,
    profile: PlayerProfile,
    calendar: CalendarDate,
    gold: u64,
    load_report: LoadReport,
    active: Option<ActiveStage>,
}

impl<S: Store> TournamentEngine<S> {
    /// Creates an engine and loads the season keys from `store`.
    ///
    /// # Arguments
    ///
    /// * `config` - Season tunables
    /// * `catalog` - Static team, coach, area and event data
    /// * `store` - Persistent key/value store
    /// * `seed` - Seed of the season RNG (rosters, groups, matches)
    ///
    /// # Errors
    ///
    /// Returns [`RoyaleError::Config`] or [`RoyaleError::Catalog`] when the
    /// configuration or catalog fail validation. Store problems are never
    /// errors here; see [`TournamentEngine::load_report`].
    pub fn new(
        config: SeasonConfig,
        catalog: Catalog,
        store: S,
        seed: u64,
    ) -> Result<Self, RoyaleError> {
        config.validate()?;
        catalog.validate()?;
        let map = catalog.area_map()?;
        let events = catalog.event_table();
        let store = SeasonStore::new(store);

        let (calendar, calendar_status) = load_or(&store, KEY_CALENDAR, CalendarDate::default);
        let (gold, gold_status) = load_or(&store, KEY_GOLD, || 0_u64);
        let (mut state, state_status) =
            load_or(&store, KEY_TOURNAMENT_STATE, || TournamentState::new(&config));
        let (profile, profile_status) = load_or(&store, KEY_PLAYER_PROFILE, PlayerProfile::default);
        state.championship_min_org_rank = config.championship.min_org_rank;

        let load_report = LoadReport {
            calendar: calendar_status,
            gold: gold_status,
            tournament_state: state_status,
            player_profile: profile_status,
        };
        if load_report.store_unavailable() {
            warn!("store unavailable at load; season will not be written back this session");
        }
        info!(
            season = state.season,
            stage = ?state.stage,
            %calendar,
            gold,
            "season loaded"
        );

        Ok(Self {
            config,
            catalog,
            map,
            events,
            store,
            rng: SimRng::seeded(seed),
            state,
            profile,
            calendar,
            gold,
            load_report,
            active: None,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Season state.
    #[must_use]
    pub fn state(&self) -> &TournamentState {
        &self.state
    }

    /// Current calendar date.
    #[must_use]
    pub fn calendar(&self) -> CalendarDate {
        self.calendar
    }

    /// Gold balance.
    #[must_use]
    pub fn gold(&self) -> u64 {
        self.gold
    }

    /// Player profile.
    #[must_use]
    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    /// Season configuration.
    #[must_use]
    pub fn config(&self) -> &SeasonConfig {
        &self.config
    }

    /// Static catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Load status of every season key.
    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// The wrapped store.
    #[must_use]
    pub fn store(&self) -> &S {
        self.store.inner()
    }

    /// Mutable access to the wrapped store.
    pub fn store_mut(&mut self) -> &mut S {
        self.store.inner_mut()
    }

    /// Stage in progress, if any.
    #[must_use]
    pub fn active_phase(&self) -> Option<StagePhase> {
        self.active.as_ref().map(|a| a.phase)
    }

    /// Standings of the stage in progress.
    #[must_use]
    pub fn standings(&self) -> Option<Vec<RankedStanding>> {
        self.active.as_ref().map(|a| match &a.progress {
            Progress::Lobbies { .. } => a.standings.ranked(),
            Progress::Bracket { bracket, .. } => {
                let teams: Vec<Team> = a.teams.values().cloned().collect();
                bracket.standings(&teams)
            }
        })
    }

    /// The next calendar event the player may enter.
    #[must_use]
    pub fn next_event(&self) -> NextEvent {
        schedule::next_eligible_event(self.calendar, &self.state)
    }

    // -------------------------------------------------------------------------
    // Calendar and profile
    // -------------------------------------------------------------------------

    /// Advances the calendar one week and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::StageInProgress`] while a stage is running.
    pub fn advance_week(&mut self) -> Result<PersistOutcome, StageError> {
        self.ensure_idle()?;
        self.calendar.advance_week();
        debug!(calendar = %self.calendar, "week advanced");
        Ok(write_key(
            &mut self.store,
            &self.load_report,
            KEY_CALENDAR,
            &self.calendar,
        ))
    }

    /// Replaces the player profile and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::StageInProgress`] while a stage is running.
    pub fn set_profile(&mut self, profile: PlayerProfile) -> Result<PersistOutcome, StageError> {
        self.ensure_idle()?;
        self.profile = profile;
        Ok(write_key(
            &mut self.store,
            &self.load_report,
            KEY_PLAYER_PROFILE,
            &self.profile,
        ))
    }

    /// Starts the next season once the current one is over.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::StageInProgress`] while a stage is running and
    /// [`StageError::SeasonInProgress`] while the season is not over.
    pub fn start_new_season(&mut self) -> Result<PersistOutcome, StageError> {
        self.ensure_idle()?;
        self.state.start_new_season()?;
        info!(season = self.state.season, org_rank = self.state.org_rank, "new season");
        Ok(write_key(
            &mut self.store,
            &self.load_report,
            KEY_TOURNAMENT_STATE,
            &self.state,
        ))
    }

    // -------------------------------------------------------------------------
    // Stages
    // -------------------------------------------------------------------------

    /// Begins the stage scheduled for the current week, if it is enterable.
    ///
    /// # Errors
    ///
    /// As [`TournamentEngine::begin_stage`].
    pub fn begin_due_stage(&mut self) -> Result<Option<TournamentStepResult>, StageError> {
        match schedule::due_phase(self.calendar, &self.state) {
            Some(phase) => self.begin_stage(phase).map(Some),
            None => Ok(None),
        }
    }

    /// Builds the roster of `phase` and plans its lobbies or bracket.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::StageInProgress`] while another stage runs,
    /// [`StageError::SeasonOver`] or [`StageError::NotEligible`] when the
    /// state does not allow `phase`, and [`StageError::RosterTooSmall`] when
    /// the field cannot be filled. A failed call changes nothing.
    pub fn begin_stage(&mut self, phase: StagePhase) -> Result<TournamentStepResult, StageError> {
        self.ensure_idle()?;
        self.state.can_enter(phase)?;

        let field_size = if phase == StagePhase::Championship {
            self.config.championship.bracket_size
        } else {
            phase.field_size()
        };
        let roster = roster::build_roster(phase, &self.state, &self.catalog, field_size)?;

        let teams: BTreeMap<TeamId, Team> = roster
            .iter()
            .filter_map(|id| self.instantiate(*id).map(|team| (*id, team)))
            .collect();
        let standings = Standings::new(
            roster.iter().filter_map(|id| {
                teams
                    .get(id)
                    .map(|t| (t.id, t.name.clone(), t.is_player))
            }),
            &mut self.rng,
        );

        let (progress, scheduled) = match self.config.stage(phase) {
            Some(stage) => {
                let lobbies = roster::plan_lobbies(phase, &roster, stage.matches, &mut self.rng);
                let scheduled = lobbies.len();
                let match_point = if phase == StagePhase::WorldFinal {
                    self.config.final_match_point
                } else {
                    None
                };
                let progress = Progress::Lobbies {
                    lobbies,
                    curve: stage.curve,
                    next: 0,
                    match_point,
                    decided: None,
                };
                (progress, scheduled)
            }
            None => {
                let bracket = Bracket::new(&roster);
                let scheduled = bracket.remaining_series();
                let progress = Progress::Bracket {
                    bracket,
                    series_length: self.config.championship.series_length,
                };
                (progress, scheduled)
            }
        };

        info!(%phase, teams = roster.len(), scheduled, "stage started");
        self.active = Some(ActiveStage {
            phase,
            teams,
            standings,
            progress,
        });
        Ok(StepResult {
            step: TournamentStep::StageStarted {
                phase,
                roster,
                scheduled,
            },
            phase: Some(phase),
            awaiting_advance: true,
        })
    }

    /// Plays the next lobby or series, or completes the stage.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NoActiveStage`] when no stage is running.
    pub fn step(&mut self) -> Result<TournamentStepResult, StageError> {
        let Some(mut active) = self.active.take() else {
            return Err(StageError::NoActiveStage);
        };
        let phase = active.phase;

        let played = match &mut active.progress {
            Progress::Lobbies {
                lobbies,
                curve,
                next,
                match_point,
                decided,
            } => {
                if decided.is_none() && *next < lobbies.len() {
                    let lobby = &lobbies[*next];
                    *next += 1;
                    let step = self.play_lobby(
                        phase,
                        *next,
                        lobby,
                        *curve,
                        &active.teams,
                        &mut active.standings,
                    );
                    if let Some(threshold) = *match_point {
                        *decided = active.standings.first_to_reach(threshold);
                        if let Some(team) = *decided {
                            info!(%phase, %team, threshold, "match point reached");
                        }
                    }
                    Some(step)
                } else {
                    None
                }
            }
            Progress::Bracket {
                bracket,
                series_length,
            } => bracket.next_pairing().map(|(a, b)| {
                let label = bracket.current_label();
                let resolver = BattleResolver::new(&self.config.match_config);
                let team_a = stage_team(&active.teams, a);
                let team_b = stage_team(&active.teams, b);
                let result =
                    bracket::play_series(&resolver, &team_a, &team_b, *series_length, &mut self.rng);
                bracket.record(&result);
                debug!(%phase, round = %label, winner = %result.winner, "series played");
                TournamentStep::SeriesPlayed {
                    phase,
                    bracket_round: label,
                    team_a: result.team_a,
                    team_b: result.team_b,
                    wins_a: result.wins_a,
                    wins_b: result.wins_b,
                    winner: result.winner,
                }
            }),
        };

        if let Some(step) = played {
            self.active = Some(active);
            return Ok(StepResult {
                step,
                phase: Some(phase),
                awaiting_advance: true,
            });
        }

        Ok(self.complete(active))
    }

    /// Runs `phase` from start to verdict.
    ///
    /// # Errors
    ///
    /// As [`TournamentEngine::begin_stage`].
    pub fn run_stage(&mut self, phase: StagePhase) -> Result<StageVerdict, StageError> {
        self.begin_stage(phase)?;
        loop {
            let result = self.step()?;
            if let TournamentStep::StageComplete { verdict, .. } = result.step {
                return Ok(verdict);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_idle(&self) -> Result<(), StageError> {
        match &self.active {
            Some(active) => Err(StageError::StageInProgress(active.phase)),
            None => Ok(()),
        }
    }

    /// Runtime team for a roster id; power ranges are drawn once per stage.
    fn instantiate(&mut self, id: TeamId) -> Option<Team> {
        if id == TeamId::PLAYER {
            return Some(self.profile.to_team(&self.catalog));
        }
        match self.catalog.team(id) {
            Ok(definition) => Some(definition.instantiate(&self.catalog, &mut self.rng)),
            Err(err) => {
                warn!(error = %err, "roster team not in catalog, skipping");
                None
            }
        }
    }

    fn play_lobby(
        &mut self,
        phase: StagePhase,
        match_number: usize,
        lobby: &Lobby,
        curve: PointCurve,
        teams: &BTreeMap<TeamId, Team>,
        standings: &mut Standings,
    ) -> TournamentStep {
        let lobby_teams: Vec<Team> = lobby
            .team_ids
            .iter()
            .filter_map(|id| teams.get(id).cloned())
            .collect();
        let mut engine = MatchEngine::with_rng(lobby_teams, self.rng.child())
            .with_config(self.config.match_config.clone())
            .with_curve(curve)
            .with_history(standings.history())
            .with_map(self.map.clone())
            .with_event_table(self.events.clone());
        let outcome = engine.run();
        standings.accumulate_match(&outcome.rows);

        debug!(
            %phase,
            match_number,
            lobby = lobby.label.as_deref().unwrap_or("-"),
            seed = outcome.seed,
            winner = ?outcome.winner(),
            "lobby played"
        );
        TournamentStep::MatchPlayed {
            phase,
            match_number,
            lobby: lobby.label.clone(),
            seed: outcome.seed,
            rows: outcome.rows,
            standings: standings.ranked(),
        }
    }

    /// Applies the verdict, credits prize gold and persists the season.
    fn complete(&mut self, active: ActiveStage) -> TournamentStepResult {
        let phase = active.phase;
        let (standings, ranking) = match &active.progress {
            Progress::Lobbies { decided, .. } => {
                let mut standings = active.standings.ranked();
                if let Some(champion) = *decided {
                    // a match-point champion tops the table regardless of totals
                    if let Some(pos) = standings.iter().position(|r| r.row.team_id == champion) {
                        let row = standings.remove(pos);
                        standings.insert(0, row);
                    }
                    for (i, row) in standings.iter_mut().enumerate() {
                        row.rank = i + 1;
                    }
                }
                let ranking = standings.iter().map(|r| r.row.team_id).collect::<Vec<_>>();
                (standings, ranking)
            }
            Progress::Bracket { bracket, .. } => {
                let teams: Vec<Team> = active.teams.values().cloned().collect();
                (bracket.standings(&teams), bracket.final_order())
            }
        };

        let verdict = self.state.apply_stage_result(phase, &ranking, &self.config);
        self.gold = self.gold.saturating_add(verdict.prize_gold);

        let (store, report) = (&mut self.store, &self.load_report);
        let persisted = write_key(store, report, KEY_TOURNAMENT_STATE, &self.state)
            .and(write_key(store, report, KEY_GOLD, &self.gold))
            .and(write_key(store, report, KEY_CALENDAR, &self.calendar));

        StepResult {
            step: TournamentStep::StageComplete {
                standings,
                verdict,
                persisted,
            },
            phase: None,
            awaiting_advance: false,
        }
    }
}

/// Writes one season key unless the store was unavailable at load.
fn write_key<S: Store, T: Serialize>(
    store: &mut SeasonStore<S>,
    report: &LoadReport,
    key: &str,
    value: &T,
) -> PersistOutcome {
    if report.store_unavailable() {
        return PersistOutcome::Failed {
            reason: "store was unavailable at load; not overwriting".to_string(),
        };
    }
    store.save(key, value)
}

/// Loads `key`, falling back to `default` for anything but a stored value.
fn load_or<S: Store, T: DeserializeOwned>(
    store: &SeasonStore<S>,
    key: &str,
    default: impl FnOnce() -> T,
) -> (T, LoadStatus) {
    let loaded: Loaded<T> = store.load(key);
    let status = loaded.status();
    match loaded {
        Loaded::Stored(value) => (value, status),
        _ => (default(), status),
    }
}

fn stage_team(teams: &BTreeMap<TeamId, Team>, id: TeamId) -> Team {
    teams
        .get(&id)
        .cloned()
        .unwrap_or_else(|| Team::new(id, id.to_string(), NEUTRAL_BASE_POWER))
}
