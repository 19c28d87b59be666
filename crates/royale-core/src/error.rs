//! Error types for the royale core.
//!
//! Errors follow the four failure classes the engines distinguish:
//!
//! - **Input malformation** (NaN stats, corrupted buffs) never reaches this
//!   module: it is sanitized where it is read.
//! - **Structural impossibility** (too few teams to fill a slot) degrades
//!   silently and is only logged.
//! - **Contract violations** (entering a stage without its qualification
//!   flag) surface as [`StageError`] from guard clauses.
//! - **Persistence failures** surface as [`StoreError`], kept distinct from
//!   "value missing, default used".

use std::path::PathBuf;

use dropzone::AreaError;
use thiserror::Error;

use crate::team::TeamId;
use crate::tournament::StagePhase;

/// Top-level error type for royale core operations.
#[derive(Debug, Error)]
pub enum RoyaleError {
    /// Persistent store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stage progression guard error
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Static catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors from the persistent key/value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// File the store is backed by.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded or decoded.
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stage progression errors.
///
/// These are raised by guard clauses before any state is touched; a failed
/// call leaves the season exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// The stage's qualification flag or phase is not set.
    #[error("{phase} is not open: {reason}")]
    NotEligible {
        /// Stage that was requested.
        phase: StagePhase,
        /// Which requirement failed.
        reason: &'static str,
    },

    /// `step` was called with no stage in progress.
    #[error("no stage in progress")]
    NoActiveStage,

    /// A stage is already running.
    #[error("{0} is already in progress")]
    StageInProgress(StagePhase),

    /// Not enough teams to build the stage roster.
    #[error("{phase} needs {needed} teams but only {available} are available")]
    RosterTooSmall {
        /// Stage being built.
        phase: StagePhase,
        /// Teams required.
        needed: usize,
        /// Teams found.
        available: usize,
    },

    /// The season is over; start a new one first.
    #[error("season is over")]
    SeasonOver,

    /// A new season was requested while the current one is still running.
    #[error("season still in progress")]
    SeasonInProgress,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for its schema.
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Static catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A referenced team id has no definition.
    #[error("unknown team id {0}")]
    UnknownTeam(TeamId),

    /// A team id was defined more than once.
    #[error("team id {0} defined more than once")]
    DuplicateTeam(TeamId),

    /// A catalog team used the id reserved for the player.
    #[error("team id 0 is reserved for the player")]
    ReservedId,

    /// An event's buff delta is outside the allowed magnitude.
    #[error("event {event} buff delta {delta} must have a magnitude between 1 and 5")]
    BuffDelta {
        /// Event key.
        event: String,
        /// Rejected delta in percent.
        delta: f64,
    },

    /// The catalog is not valid JSON for its schema.
    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The catalog's area definitions are inconsistent.
    #[error(transparent)]
    Area(#[from] AreaError),
}
