//! Persistent key/value store.
//!
//! The core needs only `get(key)` and `set(key, value)` over JSON values. A
//! missing key means "use the default" and is never an error. What *is*
//! reported is whether a value actually came from the store, so callers can
//! tell "stored as default" apart from "store unavailable, default used".
//!
//! # Architecture
//!
//! - [`Store`]: The raw contract
//! - [`MemoryStore`]: In-process map (tests, Python bindings)
//! - [`JsonFileStore`]: One JSON object per file, rewritten atomically
//! - [`SeasonStore`]: Typed access to the season keys
//!   (`calendar`, `gold`, `tournament_state`, `player_profile`)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;

/// Key of the calendar position.
pub const KEY_CALENDAR: &str = "calendar";
/// Key of the gold balance.
pub const KEY_GOLD: &str = "gold";
/// Key of the tournament state blob.
pub const KEY_TOURNAMENT_STATE: &str = "tournament_state";
/// Key of the player profile.
pub const KEY_PLAYER_PROFILE: &str = "player_profile";

/// String-keyed JSON value store.
pub trait Store {
    /// Reads a value; `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be written.
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory store.
///
/// Can be switched offline to exercise the unavailable-store paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
    offline: bool,
}

impl MemoryStore {
    /// Creates an empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Raw values, for inspection.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// Store backed by a single JSON object file.
///
/// A missing file reads as an empty store. Writes go to a sibling temporary
/// file that is then renamed over the original.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store for `path`. The file is created on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl Store for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        self.write_all(&values)
    }
}

// =============================================================================
// Typed Season Access
// =============================================================================

/// Where a loaded value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    /// Read from the store.
    Stored(T),
    /// Key absent; the default applies.
    Missing,
    /// Store could not be read; the default applies for this session.
    Unavailable(String),
    /// Stored value did not decode; the default applies.
    Corrupt(String),
}

impl<T: Default> Loaded<T> {
    /// The stored value or the default.
    pub fn into_value(self) -> T {
        match self {
            Self::Stored(value) => value,
            _ => T::default(),
        }
    }
}

impl<T> Loaded<T> {
    /// Source of the value, without the value.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        match self {
            Self::Stored(_) => LoadStatus::Stored,
            Self::Missing => LoadStatus::Missing,
            Self::Unavailable(reason) => LoadStatus::Unavailable {
                reason: reason.clone(),
            },
            Self::Corrupt(reason) => LoadStatus::Corrupt {
                reason: reason.clone(),
            },
        }
    }

    /// Whether the value came from the store.
    #[must_use]
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }

    /// Whether the store could not be read.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Serializable form of where a loaded value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// Read from the store.
    Stored,
    /// Key absent; default used.
    Missing,
    /// Store unreadable; default used.
    Unavailable {
        /// Error text.
        reason: String,
    },
    /// Value undecodable; default used.
    Corrupt {
        /// Error text.
        reason: String,
    },
}

/// Load status of every season key at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// `calendar` key.
    pub calendar: LoadStatus,
    /// `gold` key.
    pub gold: LoadStatus,
    /// `tournament_state` key.
    pub tournament_state: LoadStatus,
    /// `player_profile` key.
    pub player_profile: LoadStatus,
}

impl LoadReport {
    /// Whether any key could not be read because the store was unavailable.
    #[must_use]
    pub fn store_unavailable(&self) -> bool {
        [
            &self.calendar,
            &self.gold,
            &self.tournament_state,
            &self.player_profile,
        ]
        .iter()
        .any(|status| matches!(status, LoadStatus::Unavailable { .. }))
    }
}

/// Whether a write reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistOutcome {
    /// Written.
    Persisted,
    /// Not written; in-memory state is still correct for this session.
    Failed {
        /// Error text.
        reason: String,
    },
}

impl PersistOutcome {
    /// Whether the write succeeded.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    /// Combines two outcomes; the first failure wins.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Persisted => other,
            failed @ Self::Failed { .. } => failed,
        }
    }
}

impl From<Result<(), StoreError>> for PersistOutcome {
    fn from(result: Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => Self::Persisted,
            Err(err) => {
                warn!(error = %err, "store write failed");
                Self::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Typed access to the season keys of a [`Store`].
#[derive(Debug, Clone, Default)]
pub struct SeasonStore<S> {
    inner: S,
}

impl<S: Store> SeasonStore<S> {
    /// Wraps a raw store.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The raw store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Mutable access to the raw store.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Loads and decodes a value.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Loaded<T> {
        match self.inner.get(key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => Loaded::Stored(decoded),
                Err(err) => {
                    warn!(key, error = %err, "stored value did not decode, using default");
                    Loaded::Corrupt(err.to_string())
                }
            },
            Ok(None) => Loaded::Missing,
            Err(err) => {
                warn!(key, error = %err, "store unavailable, using default");
                Loaded::Unavailable(err.to_string())
            }
        }
    }

    /// Encodes and writes a value.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) -> PersistOutcome {
        let result = serde_json::to_value(value)
            .map_err(StoreError::from)
            .and_then(|encoded| self.inner.set(key, encoded));
        PersistOutcome::from(result)
    }
}
