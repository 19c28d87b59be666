//! # Royale Python Bindings
//!
//! PyO3 bindings exposing the match engine, the season engine and the
//! placement analysis to Python. Step results, snapshots and season state
//! cross the boundary as JSON strings; bulk numbers come back as numpy
//! arrays.
//!
//! ## Usage
//!
//! ```python
//! import json
//! import royale
//! from royale import Curve, Stage
//!
//! # A single match, stepped like a presentation layer would
//! m = royale.PyMatch(powers=[50.0] * 20, seed=42)
//! while not m.is_done:
//!     step = json.loads(m.step())
//! team_ids, places, totals = m.placements()
//!
//! # A season over a JSON save file
//! season = royale.PySeason(store_path="save.json", seed=7)
//! season.begin_stage(Stage.LOCAL)
//! while season.active_stage is not None:
//!     print(json.loads(season.step())["step"]["kind"])
//!
//! # Monte Carlo placements, curve by enum or by name
//! ids, mean_place, win_rate, mean_points = royale.simulate_placements(
//!     powers=[60.0] + [50.0] * 19, runs=1000, base_seed=1, curve="compact",
//! )
//! ```

use std::path::PathBuf;

use numpy::{PyArray1, ToPyArray};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use royale_core::analysis;
use royale_core::error::StoreError;
use royale_core::tournament::StagePhase;
use royale_core::{
    Catalog, JsonFileStore, MatchConfig, MatchEngine, MemoryStore, PointCurve, RoyaleError,
    SeasonConfig, StageError, Store, Team, TeamId, TournamentEngine,
};
use serde::Serialize;
use serde_json::Value;

// =============================================================================
// Enums
// =============================================================================

/// Placement-point curve for Python.
///
/// ```python
/// from royale import Curve
///
/// m = PyMatch(powers=[50.0] * 20, curve=Curve.COMPACT)
/// ```
#[pyclass(eq, eq_int, hash, frozen)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(non_camel_case_types)] // Python convention uses SCREAMING_SNAKE_CASE for enums
pub enum Curve {
    /// 12, 8, 6, 5, 4, 3, 2, 1, 1, 1
    STANDARD,
    /// 12, 8, 5, 3, 2, 1, 1, 1, 1, 1
    COMPACT,
}

impl From<Curve> for PointCurve {
    fn from(c: Curve) -> Self {
        match c {
            Curve::STANDARD => PointCurve::Standard,
            Curve::COMPACT => PointCurve::Compact,
        }
    }
}

/// Season stage for Python.
#[pyclass(eq, eq_int, hash, frozen)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(non_camel_case_types)]
pub enum Stage {
    LOCAL,
    NATIONAL,
    LAST_CHANCE,
    WORLD_QUAL,
    WORLD_LOSERS,
    WORLD_FINAL,
    CHAMPIONSHIP,
}

impl From<Stage> for StagePhase {
    fn from(s: Stage) -> Self {
        match s {
            Stage::LOCAL => StagePhase::Local,
            Stage::NATIONAL => StagePhase::National,
            Stage::LAST_CHANCE => StagePhase::LastChance,
            Stage::WORLD_QUAL => StagePhase::WorldQual,
            Stage::WORLD_LOSERS => StagePhase::WorldLosers,
            Stage::WORLD_FINAL => StagePhase::WorldFinal,
            Stage::CHAMPIONSHIP => StagePhase::Championship,
        }
    }
}

impl From<StagePhase> for Stage {
    fn from(p: StagePhase) -> Self {
        match p {
            StagePhase::Local => Stage::LOCAL,
            StagePhase::National => Stage::NATIONAL,
            StagePhase::LastChance => Stage::LAST_CHANCE,
            StagePhase::WorldQual => Stage::WORLD_QUAL,
            StagePhase::WorldLosers => Stage::WORLD_LOSERS,
            StagePhase::WorldFinal => Stage::WORLD_FINAL,
            StagePhase::Championship => Stage::CHAMPIONSHIP,
        }
    }
}

/// Accept either the enum or its snake_case name.
#[derive(FromPyObject)]
enum CurveOrStr {
    Curve(Curve),
    Str(String),
}

impl TryFrom<CurveOrStr> for PointCurve {
    type Error = PyErr;

    fn try_from(c: CurveOrStr) -> PyResult<Self> {
        match c {
            CurveOrStr::Curve(curve) => Ok(curve.into()),
            CurveOrStr::Str(s) => from_name(&s, "curve"),
        }
    }
}

#[derive(FromPyObject)]
enum StageOrStr {
    Stage(Stage),
    Str(String),
}

impl TryFrom<StageOrStr> for StagePhase {
    type Error = PyErr;

    fn try_from(s: StageOrStr) -> PyResult<Self> {
        match s {
            StageOrStr::Stage(stage) => Ok(stage.into()),
            StageOrStr::Str(name) => from_name(&name, "stage"),
        }
    }
}

/// Parses a snake_case serde name such as `"last_chance"`.
fn from_name<T: serde::de::DeserializeOwned>(name: &str, what: &str) -> PyResult<T> {
    serde_json::from_value(Value::String(name.to_owned()))
        .map_err(|_| PyValueError::new_err(format!("unknown {what}: {name}")))
}

// =============================================================================
// Errors and JSON
// =============================================================================

fn stage_err(err: StageError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

fn royale_err(err: RoyaleError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

// =============================================================================
// Match
// =============================================================================

/// Lobby from a list of base powers; the first entry is the player's team
/// when `with_player` is set.
fn lobby(powers: &[f64], with_player: bool) -> Vec<Team> {
    powers
        .iter()
        .zip(0_u32..)
        .map(|(power, i)| {
            if with_player && i == 0 {
                Team::new(TeamId::PLAYER, "Player", *power).as_player()
            } else {
                let id = if with_player { i } else { i + 1 };
                Team::new(TeamId::new(id), format!("Team {id}"), *power)
            }
        })
        .collect()
}

/// Single match wrapper for Python.
#[pyclass]
pub struct PyMatch {
    inner: MatchEngine,
}

#[pymethods]
impl PyMatch {
    #[new]
    #[pyo3(signature = (powers, seed=0, with_player=true, curve=None))]
    fn new(
        powers: Vec<f64>,
        seed: u64,
        with_player: bool,
        curve: Option<CurveOrStr>,
    ) -> PyResult<Self> {
        let curve = match curve {
            Some(c) => PointCurve::try_from(c)?,
            None => PointCurve::Standard,
        };
        Ok(Self {
            inner: MatchEngine::new(lobby(&powers, with_player), seed).with_curve(curve),
        })
    }

    /// Seed the match runs with.
    #[getter]
    fn seed(&self) -> u64 {
        self.inner.seed()
    }

    /// Current phase, e.g. `"round 3"`.
    #[getter]
    fn phase(&self) -> String {
        self.inner.phase().to_string()
    }

    #[getter]
    fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    /// Advances one phase and returns the step result as JSON.
    fn step(&mut self) -> PyResult<String> {
        to_json(&self.inner.step())
    }

    /// Runs to completion and returns the outcome as JSON.
    ///
    /// Releases the GIL during computation.
    fn run(&mut self, py: Python) -> PyResult<String> {
        let outcome = py.allow_threads(|| self.inner.run());
        to_json(&outcome)
    }

    /// Read-only team view as JSON.
    fn snapshot(&self) -> PyResult<String> {
        to_json(&self.inner.snapshot())
    }

    /// Result rows as `(team_ids, places, totals)` arrays in place order.
    /// Empty until the match is scored.
    fn placements<'py>(
        &self,
        py: Python<'py>,
    ) -> (
        Bound<'py, PyArray1<u32>>,
        Bound<'py, PyArray1<u32>>,
        Bound<'py, PyArray1<u32>>,
    ) {
        let rows = self.inner.rows();
        let ids: Vec<u32> = rows.iter().map(|r| r.team_id.as_u32()).collect();
        let places: Vec<u32> = rows
            .iter()
            .map(|r| u32::try_from(r.place).unwrap_or(u32::MAX))
            .collect();
        let totals: Vec<u32> = rows.iter().map(|r| r.total).collect();
        (ids.to_pyarray(py), places.to_pyarray(py), totals.to_pyarray(py))
    }
}

// =============================================================================
// Season
// =============================================================================

/// File or in-memory store, chosen at construction.
enum SeasonBacking {
    File(JsonFileStore),
    Memory(MemoryStore),
}

impl Store for SeasonBacking {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self {
            Self::File(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.set(key, value),
            Self::Memory(store) => store.set(key, value),
        }
    }
}

/// Season engine wrapper for Python.
#[pyclass]
pub struct PySeason {
    inner: TournamentEngine<SeasonBacking>,
}

#[pymethods]
impl PySeason {
    /// Opens a season. Without `store_path` nothing is persisted.
    ///
    /// `config_path` and `catalog_path` point at JSON files; the built-in
    /// defaults are used when omitted.
    #[new]
    #[pyo3(signature = (store_path=None, seed=0, config_path=None, catalog_path=None))]
    fn new(
        store_path: Option<PathBuf>,
        seed: u64,
        config_path: Option<PathBuf>,
        catalog_path: Option<PathBuf>,
    ) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => SeasonConfig::from_path(&path)
                .map_err(|e| PyValueError::new_err(e.to_string()))?,
            None => SeasonConfig::default(),
        };
        let catalog = match catalog_path {
            Some(path) => Catalog::from_path(&path).map_err(royale_err)?,
            None => Catalog::builtin(),
        };
        let backing = match store_path {
            Some(path) => SeasonBacking::File(JsonFileStore::new(path)),
            None => SeasonBacking::Memory(MemoryStore::new()),
        };
        let inner = TournamentEngine::new(config, catalog, backing, seed).map_err(royale_err)?;
        Ok(Self { inner })
    }

    /// Calendar date, e.g. `"Y1 M02 W1"`.
    #[getter]
    fn calendar(&self) -> String {
        self.inner.calendar().to_string()
    }

    #[getter]
    fn gold(&self) -> u64 {
        self.inner.gold()
    }

    #[getter]
    fn is_over(&self) -> bool {
        self.inner.state().is_over()
    }

    /// Stage currently being played, if any.
    #[getter]
    fn active_stage(&self) -> Option<Stage> {
        self.inner.active_phase().map(Stage::from)
    }

    /// Tournament state as JSON.
    fn state_json(&self) -> PyResult<String> {
        to_json(self.inner.state())
    }

    /// Per-key load statuses as JSON.
    fn load_report(&self) -> PyResult<String> {
        to_json(self.inner.load_report())
    }

    /// Nearest event the player may enter, as JSON.
    fn next_event(&self) -> PyResult<String> {
        to_json(&self.inner.next_event())
    }

    /// Standings of the running stage as JSON, or `None`.
    fn standings(&self) -> PyResult<Option<String>> {
        self.inner.standings().map(|s| to_json(&s)).transpose()
    }

    /// Advances the calendar one week. Returns whether the date was saved.
    fn advance_week(&mut self) -> PyResult<bool> {
        self.inner
            .advance_week()
            .map(|p| p.is_persisted())
            .map_err(stage_err)
    }

    /// Starts the next season once the current one is over.
    fn start_new_season(&mut self) -> PyResult<bool> {
        self.inner
            .start_new_season()
            .map(|p| p.is_persisted())
            .map_err(stage_err)
    }

    /// Begins the stage scheduled this week. Returns its start step as JSON,
    /// or `None` when nothing is due.
    fn begin_due_stage(&mut self) -> PyResult<Option<String>> {
        self.inner
            .begin_due_stage()
            .map_err(stage_err)?
            .map(|r| to_json(&r))
            .transpose()
    }

    /// Begins `stage` regardless of the calendar.
    fn begin_stage(&mut self, stage: StageOrStr) -> PyResult<String> {
        let phase = StagePhase::try_from(stage)?;
        let result = self.inner.begin_stage(phase).map_err(stage_err)?;
        to_json(&result)
    }

    /// Plays the next lobby or series and returns the step as JSON.
    ///
    /// Releases the GIL during computation.
    fn step(&mut self, py: Python) -> PyResult<String> {
        let result = py.allow_threads(|| self.inner.step()).map_err(stage_err)?;
        to_json(&result)
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Runs `runs` seeded matches of a fixed lobby in parallel.
///
/// Returns `(team_ids, mean_place, win_rate, mean_points)` arrays in team id
/// order.
#[pyfunction]
#[pyo3(signature = (powers, runs, base_seed=0, with_player=false, curve=None))]
#[allow(clippy::type_complexity)]
fn simulate_placements<'py>(
    py: Python<'py>,
    powers: Vec<f64>,
    runs: u64,
    base_seed: u64,
    with_player: bool,
    curve: Option<CurveOrStr>,
) -> PyResult<(
    Bound<'py, PyArray1<u32>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
)> {
    let curve = match curve {
        Some(c) => PointCurve::try_from(c)?,
        None => PointCurve::Standard,
    };
    let teams = lobby(&powers, with_player);
    let report = py.allow_threads(|| {
        analysis::simulate_placements(&teams, &MatchConfig::default(), curve, runs, base_seed)
    });

    let ids: Vec<u32> = report.teams.iter().map(|t| t.team_id.as_u32()).collect();
    let place: Vec<f64> = report.teams.iter().map(|t| t.placement.mean).collect();
    let win_rate: Vec<f64> = report.teams.iter().map(|t| t.win_rate()).collect();
    let points: Vec<f64> = report.teams.iter().map(|t| t.points.mean).collect();
    Ok((
        ids.to_pyarray(py),
        place.to_pyarray(py),
        win_rate.to_pyarray(py),
        points.to_pyarray(py),
    ))
}

/// Python module definition.
#[pymodule]
fn _royale(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMatch>()?;
    m.add_class::<PySeason>()?;
    m.add_class::<Curve>()?;
    m.add_class::<Stage>()?;
    m.add_function(wrap_pyfunction!(simulate_placements, m)?)?;
    Ok(())
}
