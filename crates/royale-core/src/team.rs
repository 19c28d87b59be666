//! Team model for a single match.
//!
//! This module provides the runtime team types the match engine owns for the
//! duration of one match:
//! - [`TeamId`]: Unique identifier for a team across catalog, match and season
//! - [`Member`] / [`Role`]: The three-person roster and per-member stat lines
//! - [`EventBuffs`]: Transient percentage modifiers applied by random events
//! - [`CoachSkill`]: Optional power multiplier gated by round
//! - [`Team`]: The complete per-match team state
//!
//! # Invariants
//!
//! - `eliminated == true` implies `alive == 0`
//! - A team never un-eliminates within a match
//!
//! Both are enforced by keeping the elimination fields private; the only way
//! to change them is [`Team::eliminate`] (and [`Team::reset_for_match`]
//! between matches).
//!
//! # Example
//!
//! ```
//! use dropzone::Round;
//! use royale_core::team::{Team, TeamId};
//!
//! let mut team = Team::new(TeamId::new(7), "Harbor Wolves", 55.0);
//! assert!(team.is_alive());
//!
//! team.eliminate(Round::THREE);
//! assert_eq!(team.alive(), 0);
//! assert_eq!(team.eliminated_round(), Some(Round::THREE));
//! ```

use std::fmt;

use dropzone::{AreaId, Round};
use serde::{Deserialize, Serialize};

/// Full squad size.
pub const SQUAD_SIZE: u8 = 3;

/// Unique identifier for a team.
///
/// The player's team always uses [`TeamId::PLAYER`]; catalog teams use any
/// other value.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(u32);

impl TeamId {
    /// Identifier reserved for the player's team.
    pub const PLAYER: Self = Self(0);

    /// Creates a new `TeamId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TeamId({})", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TeamId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Squad role. Kill credit is weighted Attacker > IGL > Support.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Entry fragger.
    Attacker,
    /// In-game leader.
    Igl,
    /// Utility and support.
    Support,
}

/// One squad member and their per-match stat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Squad role.
    pub role: Role,
    /// Display name.
    pub name: String,
    /// Kills credited this match.
    pub kills: u32,
    /// Assists credited this match.
    pub assists: u32,
}

impl Member {
    /// Creates a member with a clean stat line.
    #[must_use]
    pub fn new(role: Role, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            kills: 0,
            assists: 0,
        }
    }
}

/// One of the three buff channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffChannel {
    /// Aim percentage.
    Aim,
    /// Mental percentage.
    Mental,
    /// Agility percentage.
    Agility,
}

/// Transient event modifiers, reset at the start of every match.
///
/// Deltas are additive and each channel is clamped to `[-limit, +limit]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBuffs {
    /// Aim modifier in percent.
    pub aim_pct: f64,
    /// Mental modifier in percent.
    pub mental_pct: f64,
    /// Agility modifier in percent.
    pub agility_pct: f64,
}

impl EventBuffs {
    /// Returns the value of one channel.
    #[must_use]
    pub const fn get(&self, channel: BuffChannel) -> f64 {
        match channel {
            BuffChannel::Aim => self.aim_pct,
            BuffChannel::Mental => self.mental_pct,
            BuffChannel::Agility => self.agility_pct,
        }
    }

    /// Adds `delta` to a channel and clamps it to `[-limit, limit]`.
    ///
    /// A non-finite current value is reset to zero before the delta applies.
    pub fn apply(&mut self, channel: BuffChannel, delta: f64, limit: f64) {
        let limit = if limit.is_finite() { limit.abs() } else { 0.0 };
        let slot = match channel {
            BuffChannel::Aim => &mut self.aim_pct,
            BuffChannel::Mental => &mut self.mental_pct,
            BuffChannel::Agility => &mut self.agility_pct,
        };
        let current = if slot.is_finite() { *slot } else { 0.0 };
        let delta = if delta.is_finite() { delta } else { 0.0 };
        *slot = (current + delta).clamp(-limit, limit);
    }
}

/// Coach skill: a power multiplier that applies from `min_round` onward.
///
/// Endgame skills use `min_round = 5`; a skill with `min_round = 1` applies
/// all match long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachSkill {
    /// Catalog key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Power multiplier (neutral = 1.0).
    pub multiplier: f64,
    /// First round the multiplier applies in.
    pub min_round: Round,
}

/// Runtime state of one team in one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Whether this is the player's team.
    pub is_player: bool,
    /// Fixed base power, nominally `0..=100`.
    pub base_power: f64,
    /// Squad members.
    pub members: Vec<Member>,
    /// Current area (set by the drop).
    pub area: Option<AreaId>,
    /// Team kills this match.
    pub kills_total: u32,
    /// Team assists this match.
    pub assists_total: u32,
    /// Treasure collected this match.
    pub treasure: u32,
    /// Flags captured this match.
    pub flag: u32,
    /// Transient event buffs.
    pub buffs: EventBuffs,
    /// Equipped coach skill.
    pub coach: Option<CoachSkill>,
    alive: u8,
    eliminated: bool,
    eliminated_round: Option<Round>,
}

impl Team {
    /// Creates a team with no members and a clean match state.
    #[must_use]
    pub fn new(id: TeamId, name: impl Into<String>, base_power: f64) -> Self {
        Self {
            id,
            name: name.into(),
            is_player: false,
            base_power,
            members: Vec::new(),
            area: None,
            kills_total: 0,
            assists_total: 0,
            treasure: 0,
            flag: 0,
            buffs: EventBuffs::default(),
            coach: None,
            alive: SQUAD_SIZE,
            eliminated: false,
            eliminated_round: None,
        }
    }

    /// Sets the squad.
    #[must_use]
    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Marks the team as the player's.
    #[must_use]
    pub fn as_player(mut self) -> Self {
        self.is_player = true;
        self
    }

    /// Equips a coach skill.
    #[must_use]
    pub fn with_coach(mut self, coach: Option<CoachSkill>) -> Self {
        self.coach = coach;
        self
    }

    /// Members still standing (`0..=3`).
    #[must_use]
    pub const fn alive(&self) -> u8 {
        self.alive
    }

    /// Whether the team has been eliminated this match.
    #[must_use]
    pub const fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    /// Whether the team is still in the match.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.eliminated
    }

    /// Round the team was eliminated in, if any.
    #[must_use]
    pub const fn eliminated_round(&self) -> Option<Round> {
        self.eliminated_round
    }

    /// Eliminates the team in `round`.
    ///
    /// Idempotent: a team already eliminated keeps its original round.
    pub fn eliminate(&mut self, round: Round) {
        if self.eliminated {
            return;
        }
        self.alive = 0;
        self.eliminated = true;
        self.eliminated_round = Some(round);
    }

    /// Resets every transient per-match field.
    pub fn reset_for_match(&mut self) {
        self.area = None;
        self.kills_total = 0;
        self.assists_total = 0;
        self.treasure = 0;
        self.flag = 0;
        self.buffs = EventBuffs::default();
        self.alive = SQUAD_SIZE;
        self.eliminated = false;
        self.eliminated_round = None;
        for member in &mut self.members {
            member.kills = 0;
            member.assists = 0;
        }
    }
}
