//! Persisted season state and the qualification rules.
//!
//! [`TournamentState`] is the single value that records where the player is
//! in the season ladder. It is written only at stage-completion boundaries,
//! by [`TournamentState::apply_stage_result`], and every stage entry is
//! checked against it by [`TournamentState::can_enter`]. Nothing is ever
//! re-derived from the calendar: a stage opens only when its flag is set.
//!
//! # Qualification Cut-offs
//!
//! | stage | cut |
//! |-------|-----|
//! | Local | 1–10 → National |
//! | National | 1–8 → World, 9–28 → Last-Chance, 29–40 out |
//! | Last-Chance | 1–2 → World |
//! | World Qualifiers | 1–10 → Final, 11–30 → Losers, 31–40 out |
//! | World Losers | 1–10 → Final |
//! | World Final | 1–3 → Championship (with organisation rank) |

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{Catalog, MemberDefinition};
use crate::config::SeasonConfig;
use crate::error::StageError;
use crate::team::{Member, Role, Team, TeamId};

// =============================================================================
// Stage Enums
// =============================================================================

/// Current tier of the season ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Local qualifiers.
    Local,
    /// National league.
    National,
    /// Last-Chance qualifier.
    LastChance,
    /// World event (see [`WorldPhase`]).
    World,
    /// Championship bracket.
    Championship,
    /// Season over for the player.
    Done,
}

/// Sub-phase of the World stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldPhase {
    /// 40-team qualifiers.
    Qual,
    /// Losers bracket.
    Losers,
    /// 20-team final.
    Final,
    /// World stage finished.
    Done,
}

/// A playable stage, as entered by the tournament engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    /// Local qualifiers.
    Local,
    /// National league.
    National,
    /// Last-Chance qualifier.
    LastChance,
    /// World qualifiers.
    WorldQual,
    /// World losers bracket.
    WorldLosers,
    /// World final.
    WorldFinal,
    /// Championship bracket.
    Championship,
}

impl StagePhase {
    /// Every phase in ladder order.
    pub const ALL: [Self; 7] = [
        Self::Local,
        Self::National,
        Self::LastChance,
        Self::WorldQual,
        Self::WorldLosers,
        Self::WorldFinal,
        Self::Championship,
    ];

    /// Display title for schedules and banners.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Local => "Local Qualifiers",
            Self::National => "National League",
            Self::LastChance => "Last-Chance Qualifier",
            Self::WorldQual => "World Qualifiers",
            Self::WorldLosers => "World Losers Bracket",
            Self::WorldFinal => "World Final",
            Self::Championship => "Championship",
        }
    }

    /// Roster size of the stage.
    #[must_use]
    pub const fn field_size(self) -> usize {
        match self {
            Self::National | Self::WorldQual => 40,
            Self::Championship => 8,
            Self::Local | Self::LastChance | Self::WorldLosers | Self::WorldFinal => 20,
        }
    }
}

impl fmt::Display for StagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::National => "national",
            Self::LastChance => "last-chance",
            Self::WorldQual => "world qualifiers",
            Self::WorldLosers => "world losers",
            Self::WorldFinal => "world final",
            Self::Championship => "championship",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Persisted qualification flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Qualifications: u8 {
        /// Qualified for the National league.
        const NATIONAL = 1 << 0;
        /// Unlocked the Last-Chance qualifier.
        const LAST_CHANCE = 1 << 1;
        /// Qualified for the World stage.
        const WORLD = 1 << 2;
        /// Qualified for the Championship.
        const CHAMPIONSHIP = 1 << 3;
    }
}

impl Default for Qualifications {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Calendar
// =============================================================================

/// Weeks per month.
pub const WEEKS_PER_MONTH: u8 = 4;

/// Months per year.
pub const MONTHS_PER_YEAR: u8 = 12;

/// Calendar position: `year`, `month` 1–12, `week` 1–4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    /// Year, starting at 1.
    pub year: u32,
    /// Month, 1–12.
    pub month: u8,
    /// Week of the month, 1–4.
    pub week: u8,
}

impl CalendarDate {
    /// Creates a date, clamping month and week into range.
    #[must_use]
    pub fn new(year: u32, month: u8, week: u8) -> Self {
        Self {
            year,
            month: month.clamp(1, MONTHS_PER_YEAR),
            week: week.clamp(1, WEEKS_PER_MONTH),
        }
    }

    /// Moves one week forward, rolling months and years.
    pub fn advance_week(&mut self) {
        if self.week >= WEEKS_PER_MONTH {
            self.week = 1;
            if self.month >= MONTHS_PER_YEAR {
                self.month = 1;
                self.year = self.year.saturating_add(1);
            } else {
                self.month += 1;
            }
        } else {
            self.week += 1;
        }
    }

    /// Absolute week index.
    #[must_use]
    pub fn week_index(&self) -> u64 {
        let months = u64::from(self.year) * u64::from(MONTHS_PER_YEAR)
            + u64::from(self.month.saturating_sub(1));
        months * u64::from(WEEKS_PER_MONTH) + u64::from(self.week.saturating_sub(1))
    }

    /// Weeks from `self` until `later`, or `None` if `later` is in the past.
    #[must_use]
    pub fn weeks_until(&self, later: &Self) -> Option<u64> {
        later.week_index().checked_sub(self.week_index())
    }
}

impl Default for CalendarDate {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y{} M{:02} W{}", self.year, self.month, self.week)
    }
}

// =============================================================================
// Player Profile
// =============================================================================

/// The player's team as persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Team name.
    pub team_name: String,
    /// Squad.
    pub members: Vec<MemberDefinition>,
    /// Base power.
    pub base_power: f64,
    /// Equipped coach skill key.
    pub coach_skill: Option<String>,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        let member = |role, name: &str| MemberDefinition {
            role,
            name: name.to_string(),
        };
        Self {
            team_name: "Player Squad".to_string(),
            members: vec![
                member(Role::Attacker, "Vanguard"),
                member(Role::Igl, "Compass"),
                member(Role::Support, "Anchor"),
            ],
            base_power: 50.0,
            coach_skill: None,
        }
    }
}

impl PlayerProfile {
    /// Builds the player's runtime team, resolving the coach skill against
    /// `catalog`. An unknown coach key equips nothing.
    #[must_use]
    pub fn to_team(&self, catalog: &Catalog) -> Team {
        let members = self
            .members
            .iter()
            .map(|m| Member::new(m.role, m.name.clone()))
            .collect();
        let coach = self
            .coach_skill
            .as_deref()
            .and_then(|key| catalog.coach_skill(key))
            .cloned();
        Team::new(TeamId::PLAYER, self.team_name.clone(), self.base_power)
            .with_members(members)
            .with_coach(coach)
            .as_player()
    }
}

// =============================================================================
// Verdict
// =============================================================================

/// What a completed stage changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageVerdict {
    /// Completed stage.
    pub phase: StagePhase,
    /// Player's final rank, if the player took part.
    pub player_rank: Option<usize>,
    /// Flags earned by this result.
    pub flags_earned: Qualifications,
    /// Teams carried forward to the next stage or phase.
    pub advanced: Vec<TeamId>,
    /// Whether the player's season ended with this stage.
    pub season_over: bool,
    /// Champion, for the World Final and the Championship.
    pub champion: Option<TeamId>,
    /// Gold paid to the player.
    pub prize_gold: u64,
    /// Organisation rank after the stage.
    pub org_rank: u32,
}

// =============================================================================
// Tournament State
// =============================================================================

/// Season progression state.
///
/// # Example
///
/// ```
/// use royale_core::config::SeasonConfig;
/// use royale_core::tournament::{Qualifications, StagePhase, TournamentState};
///
/// let state = TournamentState::new(&SeasonConfig::default());
/// assert!(state.can_enter(StagePhase::Local).is_ok());
/// assert!(state.can_enter(StagePhase::National).is_err());
/// assert_eq!(state.qualifications, Qualifications::empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentState {
    /// Season number, starting at 1.
    pub season: u32,
    /// Current ladder tier.
    pub stage: Stage,
    /// Earned qualification flags.
    pub qualifications: Qualifications,
    /// World sub-phase.
    pub world_phase: WorldPhase,
    /// Organisation rank of the player (carried across seasons).
    pub org_rank: u32,
    /// Minimum organisation rank for the championship.
    pub championship_min_org_rank: u32,
    /// Local top 10, carried into National.
    pub national_ids: Vec<TeamId>,
    /// National ranks 9–28.
    pub last_chance_ids: Vec<TeamId>,
    /// World qualifiers carried in from National and Last-Chance.
    pub world_ids: Vec<TeamId>,
    /// World qualifier ranks 11–30.
    pub world_losers_ids: Vec<TeamId>,
    /// World Final field.
    pub world_final_ids: Vec<TeamId>,
    /// Championship seeds in World Final order.
    pub championship_ids: Vec<TeamId>,
    /// Champion of the last completed World Final or Championship.
    pub champion: Option<TeamId>,
}

impl Default for TournamentState {
    fn default() -> Self {
        Self::new(&SeasonConfig::default())
    }
}

impl TournamentState {
    /// A fresh first season.
    #[must_use]
    pub fn new(config: &SeasonConfig) -> Self {
        Self {
            season: 1,
            stage: Stage::Local,
            qualifications: Qualifications::empty(),
            world_phase: WorldPhase::Qual,
            org_rank: 1,
            championship_min_org_rank: config.championship.min_org_rank,
            national_ids: Vec::new(),
            last_chance_ids: Vec::new(),
            world_ids: Vec::new(),
            world_losers_ids: Vec::new(),
            world_final_ids: Vec::new(),
            championship_ids: Vec::new(),
            champion: None,
        }
    }

    /// Whether the player's season is over.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Checks whether `phase` may be entered now.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::SeasonOver`] once the season is done, and
    /// [`StageError::NotEligible`] naming the first unmet requirement.
    pub fn can_enter(&self, phase: StagePhase) -> Result<(), StageError> {
        if self.is_over() {
            return Err(StageError::SeasonOver);
        }
        let not = |reason| Err(StageError::NotEligible { phase, reason });
        match phase {
            StagePhase::Local => {
                if self.stage != Stage::Local {
                    return not("local stage already played this season");
                }
            }
            StagePhase::National => {
                if !self.qualifications.contains(Qualifications::NATIONAL) {
                    return not("national qualification flag not set");
                }
                if self.stage != Stage::National {
                    return not("national is not the current stage");
                }
            }
            StagePhase::LastChance => {
                if !self.qualifications.contains(Qualifications::LAST_CHANCE) {
                    return not("last-chance flag not set");
                }
                if self.stage != Stage::LastChance {
                    return not("last-chance is not the current stage");
                }
            }
            StagePhase::WorldQual | StagePhase::WorldLosers | StagePhase::WorldFinal => {
                if !self.qualifications.contains(Qualifications::WORLD) {
                    return not("world qualification flag not set");
                }
                if self.stage != Stage::World {
                    return not("world is not the current stage");
                }
                let required = match phase {
                    StagePhase::WorldQual => WorldPhase::Qual,
                    StagePhase::WorldLosers => WorldPhase::Losers,
                    _ => WorldPhase::Final,
                };
                if self.world_phase != required {
                    return not("world phase does not match");
                }
            }
            StagePhase::Championship => {
                if !self.qualifications.contains(Qualifications::CHAMPIONSHIP) {
                    return not("championship qualification flag not set");
                }
                if self.org_rank < self.championship_min_org_rank {
                    return not("organisation rank below championship minimum");
                }
                if self.stage != Stage::Championship {
                    return not("championship is not the current stage");
                }
            }
        }
        Ok(())
    }

    /// Team ids carried into `phase` from earlier stages.
    #[must_use]
    pub fn carried_ids(&self, phase: StagePhase) -> &[TeamId] {
        match phase {
            StagePhase::Local => &[],
            StagePhase::National => &self.national_ids,
            StagePhase::LastChance => &self.last_chance_ids,
            StagePhase::WorldQual => &self.world_ids,
            StagePhase::WorldLosers => &self.world_losers_ids,
            StagePhase::WorldFinal => &self.world_final_ids,
            StagePhase::Championship => &self.championship_ids,
        }
    }

    /// Applies a completed stage's final ranking.
    ///
    /// This is the only writer of qualification flags. It sets the flags the
    /// player earned, records the team ids carried forward, moves the stage
    /// pointer and bumps the organisation rank once per flag earned.
    ///
    /// # Arguments
    ///
    /// * `phase` - The completed stage
    /// * `ranking` - Final ranking, best first
    /// * `config` - Season configuration (prizes, championship rules)
    pub fn apply_stage_result(
        &mut self,
        phase: StagePhase,
        ranking: &[TeamId],
        config: &SeasonConfig,
    ) -> StageVerdict {
        let player_rank = ranking
            .iter()
            .position(|id| *id == TeamId::PLAYER)
            .map(|i| i + 1);
        let within = |cut: usize| player_rank.is_some_and(|r| r <= cut);
        let mut earned = Qualifications::empty();
        let mut champion = None;

        let advanced = match phase {
            StagePhase::Local => {
                let top = slice(ranking, 0, 10);
                self.national_ids = top.clone();
                if within(10) {
                    earned |= Qualifications::NATIONAL;
                    self.stage = Stage::National;
                } else {
                    self.stage = Stage::Done;
                }
                top
            }
            StagePhase::National => {
                let direct = slice(ranking, 0, 8);
                self.last_chance_ids = slice(ranking, 8, 28);
                self.world_ids = direct.clone();
                if within(8) {
                    earned |= Qualifications::WORLD;
                    // Last-Chance is skipped; its spots go to the top of that cohort.
                    self.world_ids
                        .extend(self.last_chance_ids.iter().take(2).copied());
                    self.stage = Stage::World;
                    self.world_phase = WorldPhase::Qual;
                } else if within(28) {
                    earned |= Qualifications::LAST_CHANCE;
                    self.stage = Stage::LastChance;
                } else {
                    self.stage = Stage::Done;
                }
                direct
            }
            StagePhase::LastChance => {
                let top = slice(ranking, 0, 2);
                self.world_ids.extend(top.iter().copied());
                if within(2) {
                    earned |= Qualifications::WORLD;
                    self.stage = Stage::World;
                    self.world_phase = WorldPhase::Qual;
                } else {
                    self.stage = Stage::Done;
                }
                top
            }
            StagePhase::WorldQual => {
                self.world_final_ids = slice(ranking, 0, 10);
                self.world_losers_ids = slice(ranking, 10, 30);
                self.world_phase = WorldPhase::Losers;
                if !within(30) {
                    self.world_phase = WorldPhase::Done;
                    self.stage = Stage::Done;
                }
                self.world_final_ids.clone()
            }
            StagePhase::WorldLosers => {
                let top = slice(ranking, 0, 10);
                self.world_final_ids.extend(top.iter().copied());
                self.world_phase = WorldPhase::Final;
                if player_rank.is_some() && !within(10) {
                    self.world_phase = WorldPhase::Done;
                    self.stage = Stage::Done;
                }
                top
            }
            StagePhase::WorldFinal => {
                champion = ranking.first().copied();
                self.championship_ids = slice(ranking, 0, config.championship.bracket_size);
                self.world_phase = WorldPhase::Done;
                if within(3) {
                    earned |= Qualifications::CHAMPIONSHIP;
                }
                self.championship_ids.clone()
            }
            StagePhase::Championship => {
                champion = ranking.first().copied();
                self.stage = Stage::Done;
                champion.into_iter().collect()
            }
        };

        self.qualifications |= earned;
        self.org_rank = self.org_rank.saturating_add(earned.bits().count_ones());
        if phase == StagePhase::WorldFinal {
            self.stage = if earned.contains(Qualifications::CHAMPIONSHIP)
                && self.org_rank >= self.championship_min_org_rank
            {
                Stage::Championship
            } else {
                Stage::Done
            };
        }
        if champion.is_some() {
            self.champion = champion;
        }

        let prize_gold = match phase {
            StagePhase::Championship => {
                if champion == Some(TeamId::PLAYER) {
                    config.championship.champion_prize
                } else {
                    0
                }
            }
            _ => match (config.stage(phase), player_rank) {
                (Some(stage), Some(rank)) => stage.prize_for(rank),
                _ => 0,
            },
        };

        info!(
            %phase,
            player_rank = ?player_rank,
            earned = ?earned,
            stage = ?self.stage,
            org_rank = self.org_rank,
            "stage result applied"
        );

        StageVerdict {
            phase,
            player_rank,
            flags_earned: earned,
            advanced,
            season_over: self.is_over(),
            champion,
            prize_gold,
            org_rank: self.org_rank,
        }
    }

    /// Starts the next season, keeping the organisation rank.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::SeasonInProgress`] unless the current season is
    /// over.
    pub fn start_new_season(&mut self) -> Result<(), StageError> {
        if !self.is_over() {
            return Err(StageError::SeasonInProgress);
        }
        *self = Self {
            season: self.season.saturating_add(1),
            org_rank: self.org_rank,
            championship_min_org_rank: self.championship_min_org_rank,
            champion: self.champion,
            ..Self::default()
        };
        Ok(())
    }
}

fn slice(ranking: &[TeamId], from: usize, to: usize) -> Vec<TeamId> {
    let to = to.min(ranking.len());
    let from = from.min(to);
    ranking[from..to].to_vec()
}
