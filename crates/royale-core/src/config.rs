//! Match and season configuration.
//!
//! All tunables live here with the values the simulator ships with as their
//! `Default`. Configurations deserialize from JSON with every field optional
//! (`#[serde(default)]`), so a file only needs the values it overrides.
//!
//! # Example
//!
//! ```
//! use dropzone::Round;
//! use royale_core::config::{MatchConfig, SeasonConfig};
//!
//! let config = MatchConfig::default();
//! assert_eq!(config.slots(Round::FIVE), 2);
//!
//! let season = SeasonConfig::from_json_str(r#"{ "final_match_point": 50 }"#).unwrap();
//! assert_eq!(season.final_match_point, Some(50));
//! assert_eq!(season.local.matches, 5);
//! ```

use std::path::Path;

use dropzone::Round;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scoring::PointCurve;
use crate::team::Role;
use crate::tournament::StagePhase;

// =============================================================================
// Match Configuration
// =============================================================================

/// Kill-credit weights per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleWeights {
    /// Attacker weight
    pub attacker: u32,
    /// IGL weight
    pub igl: u32,
    /// Support weight
    pub support: u32,
}

impl RoleWeights {
    /// Weight for a role.
    #[must_use]
    pub const fn weight(&self, role: Role) -> u32 {
        match role {
            Role::Attacker => self.attacker,
            Role::Igl => self.igl,
            Role::Support => self.support,
        }
    }
}

impl Default for RoleWeights {
    fn default() -> Self {
        Self {
            attacker: 5,
            igl: 3,
            support: 2,
        }
    }
}

/// Tunables for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Encounter slots per round.
    pub encounter_slots: [usize; Round::COUNT],
    /// Player involvement probability per round. The round-1 entry is the
    /// fallback used only when the player's drop was uncontested.
    pub involvement: [f64; Round::COUNT],
    /// Random events rolled per round.
    pub events_per_round: [usize; Round::COUNT],
    /// Each buff channel is clamped to `[-buff_limit_pct, buff_limit_pct]`.
    pub buff_limit_pct: f64,
    /// Win-probability points per point of power difference.
    pub win_slope: f64,
    /// Lower bound of the win probability, in percent.
    pub win_floor_pct: f64,
    /// Upper bound of the win probability, in percent.
    pub win_ceiling_pct: f64,
    /// Whether battles credit kills and assists.
    pub kill_accounting: bool,
    /// Kill-credit weights per role.
    pub role_weights: RoleWeights,
    /// Probability that a kill also credits one assist.
    pub assist_chance: f64,
    /// Maximum kills credited to the winner of a battle.
    pub max_winner_kills: u32,
    /// Maximum kills credited to the loser of a battle.
    pub max_loser_kills: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            encounter_slots: [4, 4, 4, 4, 2, 1],
            involvement: [0.60, 0.70, 0.75, 0.80, 0.85, 1.00],
            events_per_round: [1, 2, 2, 2, 2, 0],
            buff_limit_pct: 30.0,
            win_slope: 1.8,
            win_floor_pct: 22.0,
            win_ceiling_pct: 78.0,
            kill_accounting: true,
            role_weights: RoleWeights::default(),
            assist_chance: 0.5,
            max_winner_kills: 3,
            max_loser_kills: 2,
        }
    }
}

impl MatchConfig {
    /// Encounter slots in `round`.
    #[must_use]
    pub const fn slots(&self, round: Round) -> usize {
        self.encounter_slots[round.index()]
    }

    /// Base player involvement probability in `round`.
    #[must_use]
    pub const fn involvement(&self, round: Round) -> f64 {
        self.involvement[round.index()]
    }

    /// Planned event count in `round`.
    #[must_use]
    pub const fn events(&self, round: Round) -> usize {
        self.events_per_round[round.index()]
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encounter_slots.contains(&0) {
            return Err(invalid("encounter_slots", "every round needs at least one slot"));
        }
        if self
            .involvement
            .iter()
            .any(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
        {
            return Err(invalid("involvement", "probabilities must be within [0, 1]"));
        }
        if !self.assist_chance.is_finite() || !(0.0..=1.0).contains(&self.assist_chance) {
            return Err(invalid("assist_chance", "must be within [0, 1]"));
        }
        if !self.buff_limit_pct.is_finite() || self.buff_limit_pct < 0.0 {
            return Err(invalid("buff_limit_pct", "must be a non-negative number"));
        }
        if !self.win_slope.is_finite() {
            return Err(invalid("win_slope", "must be finite"));
        }
        if !(self.win_floor_pct.is_finite()
            && self.win_ceiling_pct.is_finite()
            && 0.0 <= self.win_floor_pct
            && self.win_floor_pct <= self.win_ceiling_pct
            && self.win_ceiling_pct <= 100.0)
        {
            return Err(invalid(
                "win_floor_pct",
                "bounds must satisfy 0 <= floor <= ceiling <= 100",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Season Configuration
// =============================================================================

/// Tunables for one lobby-based stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Matches (lobbies) played in the stage.
    pub matches: usize,
    /// Placement-point curve used by every match of the stage.
    pub curve: PointCurve,
    /// Gold paid to the player by final stage rank (index 0 = 1st).
    #[serde(default)]
    pub prize_gold: Vec<u64>,
}

impl StageConfig {
    /// Creates a stage config with no prize money.
    #[must_use]
    pub fn new(matches: usize, curve: PointCurve) -> Self {
        Self {
            matches,
            curve,
            prize_gold: Vec::new(),
        }
    }

    /// Prize for finishing at `rank` (1-based).
    #[must_use]
    pub fn prize_for(&self, rank: usize) -> u64 {
        rank.checked_sub(1)
            .and_then(|i| self.prize_gold.get(i))
            .copied()
            .unwrap_or(0)
    }
}

/// Championship bracket tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChampionshipConfig {
    /// Minimum organisation rank required to enter.
    pub min_org_rank: u32,
    /// Bracket size (power of two).
    pub bracket_size: usize,
    /// Duels per series (odd; first to a majority wins).
    pub series_length: u32,
    /// Gold paid to the player for winning the championship.
    pub champion_prize: u64,
}

impl Default for ChampionshipConfig {
    fn default() -> Self {
        Self {
            min_org_rank: 3,
            bracket_size: 8,
            series_length: 3,
            champion_prize: 50_000,
        }
    }
}

/// Tunables for a whole season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    /// Per-match tunables shared by every stage.
    pub match_config: MatchConfig,
    /// Local stage.
    pub local: StageConfig,
    /// National stage.
    pub national: StageConfig,
    /// Last-Chance stage.
    pub last_chance: StageConfig,
    /// World qualifiers.
    pub world_qual: StageConfig,
    /// World losers bracket.
    pub world_losers: StageConfig,
    /// World final.
    pub world_final: StageConfig,
    /// Match-point threshold for the World Final; `None` disables the rule.
    pub final_match_point: Option<u32>,
    /// Championship bracket.
    pub championship: ChampionshipConfig,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            local: StageConfig {
                prize_gold: vec![3_000, 2_000, 1_000],
                ..StageConfig::new(5, PointCurve::Standard)
            },
            national: StageConfig {
                prize_gold: vec![8_000, 5_000, 3_000],
                ..StageConfig::new(6, PointCurve::Standard)
            },
            last_chance: StageConfig {
                prize_gold: vec![4_000, 2_000],
                ..StageConfig::new(5, PointCurve::Standard)
            },
            world_qual: StageConfig::new(6, PointCurve::Compact),
            world_losers: StageConfig::new(5, PointCurve::Compact),
            world_final: StageConfig {
                prize_gold: vec![30_000, 15_000, 8_000],
                ..StageConfig::new(5, PointCurve::Standard)
            },
            final_match_point: None,
            championship: ChampionshipConfig::default(),
        }
    }
}

impl SeasonConfig {
    /// Parses a season config from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a season config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`SeasonConfig::from_json_str`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Lobby-stage tunables for `phase`; `None` for the championship bracket.
    #[must_use]
    pub fn stage(&self, phase: StagePhase) -> Option<&StageConfig> {
        match phase {
            StagePhase::Local => Some(&self.local),
            StagePhase::National => Some(&self.national),
            StagePhase::LastChance => Some(&self.last_chance),
            StagePhase::WorldQual => Some(&self.world_qual),
            StagePhase::WorldLosers => Some(&self.world_losers),
            StagePhase::WorldFinal => Some(&self.world_final),
            StagePhase::Championship => None,
        }
    }

    /// Checks value ranges across every stage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.match_config.validate()?;
        for (field, stage) in [
            ("local.matches", &self.local),
            ("national.matches", &self.national),
            ("last_chance.matches", &self.last_chance),
            ("world_qual.matches", &self.world_qual),
            ("world_losers.matches", &self.world_losers),
            ("world_final.matches", &self.world_final),
        ] {
            if stage.matches == 0 {
                return Err(invalid(field, "a stage needs at least one match"));
            }
        }
        let bracket = self.championship.bracket_size;
        if bracket < 2 || !bracket.is_power_of_two() {
            return Err(invalid(
                "championship.bracket_size",
                "must be a power of two of at least 2",
            ));
        }
        if self.championship.series_length % 2 == 0 {
            return Err(invalid("championship.series_length", "must be odd"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
