//! Match scoring, tie-breaking and cumulative standings.
//!
//! # Match Placement
//!
//! [`score_match`] ranks the teams of a finished match:
//!
//! 1. Teams are grouped by elimination round. Survivors rank above every
//!    eliminated team; a team eliminated in a later round ranks above one
//!    eliminated earlier.
//! 2. Within a group the order is decided by this chain:
//!    - match points before placement (kills + assists + treasure + flags×2)
//!    - total kills
//!    - lower average placement so far in the stage ([`TieBreakHistory`])
//!    - total assists
//!    - a random coin key drawn per team from the match RNG
//!
//! Places are then assigned `1..=N` in that order and placement points are
//! looked up from the stage's [`PointCurve`].
//!
//! # Standings
//!
//! [`Standings`] accumulates match rows for one stage and ranks teams with the
//! same chain at the cumulative level (total points, kills, average place,
//! assists, coin key).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use dropzone::{Round, SimRng};
use serde::{Deserialize, Serialize};

use crate::team::{Team, TeamId};

// =============================================================================
// Point Curves
// =============================================================================

/// Placement-point table, selectable per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCurve {
    /// 12, 8, 6, 5, 4, 3, 2, 1, 1, 1 for places 1–10.
    Standard,
    /// 12, 8, 5, 3, 2, 1, 1, 1, 1, 1 for places 1–10.
    Compact,
}

impl PointCurve {
    const STANDARD: [u32; 10] = [12, 8, 6, 5, 4, 3, 2, 1, 1, 1];
    const COMPACT: [u32; 10] = [12, 8, 5, 3, 2, 1, 1, 1, 1, 1];

    /// Points for places 1–10; every later place scores zero.
    #[must_use]
    pub const fn table(self) -> &'static [u32; 10] {
        match self {
            Self::Standard => &Self::STANDARD,
            Self::Compact => &Self::COMPACT,
        }
    }

    /// Points for a 1-based place.
    #[must_use]
    pub fn points(self, place: usize) -> u32 {
        place
            .checked_sub(1)
            .and_then(|i| self.table().get(i))
            .copied()
            .unwrap_or(0)
    }
}

// =============================================================================
// Match Rows
// =============================================================================

/// One team's line in a match result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    /// Final place, `1..=N`.
    pub place: usize,
    /// Team identifier.
    pub team_id: TeamId,
    /// Team display name.
    pub team_name: String,
    /// Whether this is the player's team.
    pub is_player: bool,
    /// Round of elimination; `None` for the survivor(s).
    pub eliminated_round: Option<Round>,
    /// Points from the placement curve.
    pub placement_points: u32,
    /// One point per kill.
    pub kill_points: u32,
    /// One point per assist.
    pub assist_points: u32,
    /// One point per treasure.
    pub treasure_points: u32,
    /// Two points per flag.
    pub flag_points: u32,
    /// Sum of all point columns.
    pub total: u32,
}

/// Average placement per team so far in the current stage.
///
/// Built from [`Standings::history`] before each match. Teams missing from the
/// history have no average.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TieBreakHistory {
    averages: BTreeMap<TeamId, f64>,
}

impl TieBreakHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a team's average place. Non-finite values are ignored.
    pub fn insert(&mut self, team: TeamId, average_place: f64) {
        if average_place.is_finite() {
            self.averages.insert(team, average_place);
        }
    }

    /// Average place of a team, if known.
    #[must_use]
    pub fn average(&self, team: TeamId) -> Option<f64> {
        self.averages.get(&team).copied()
    }

    /// Whether no team has history.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }
}

struct Candidate<'a> {
    team: &'a Team,
    group: u8,
    points: u32,
    average: Option<f64>,
    coin: u64,
}

fn non_placement_points(team: &Team) -> u32 {
    team.kills_total
        .saturating_add(team.assists_total)
        .saturating_add(team.treasure)
        .saturating_add(team.flag.saturating_mul(2))
}

fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    b.group
        .cmp(&a.group)
        .then_with(|| b.points.cmp(&a.points))
        .then_with(|| b.team.kills_total.cmp(&a.team.kills_total))
        .then_with(|| match (a.average, b.average) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        })
        .then_with(|| b.team.assists_total.cmp(&a.team.assists_total))
        .then_with(|| a.coin.cmp(&b.coin))
}

/// Ranks a finished match and assigns placement points.
///
/// Coin keys are drawn in team-id order, so the ranking depends only on the
/// teams' state and the RNG, never on the order of `teams`. The average-place
/// key applies only when every team in the lobby has history; otherwise it is
/// skipped for the whole lobby.
///
/// # Arguments
///
/// * `teams` - Every team of the match, in any order
/// * `curve` - Placement-point curve of the stage
/// * `history` - Average places so far in the stage
/// * `rng` - Match RNG, used only for coin keys
///
/// # Returns
///
/// One row per team, ordered by place (`1..=teams.len()`).
pub fn score_match(
    teams: &[Team],
    curve: PointCurve,
    history: &TieBreakHistory,
    rng: &mut SimRng,
) -> Vec<MatchRow> {
    let mut by_id: Vec<&Team> = teams.iter().collect();
    by_id.sort_by_key(|t| t.id);

    let use_history = by_id.iter().all(|t| history.average(t.id).is_some());
    let mut candidates: Vec<Candidate<'_>> = by_id
        .into_iter()
        .map(|team| Candidate {
            team,
            group: team.eliminated_round().map_or(u8::MAX, Round::get),
            points: non_placement_points(team),
            average: if use_history {
                history.average(team.id)
            } else {
                None
            },
            coin: rng.next_u64(),
        })
        .collect();
    candidates.sort_by(compare_candidates);

    candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let place = i + 1;
            let team = c.team;
            let placement_points = curve.points(place);
            let flag_points = team.flag.saturating_mul(2);
            MatchRow {
                place,
                team_id: team.id,
                team_name: team.name.clone(),
                is_player: team.is_player,
                eliminated_round: team.eliminated_round(),
                placement_points,
                kill_points: team.kills_total,
                assist_points: team.assists_total,
                treasure_points: team.treasure,
                flag_points,
                total: placement_points.saturating_add(c.points),
            }
        })
        .collect()
}

// =============================================================================
// Standings
// =============================================================================

/// Cumulative totals of one team over a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    /// Team identifier.
    pub team_id: TeamId,
    /// Team display name.
    pub team_name: String,
    /// Whether this is the player's team.
    pub is_player: bool,
    /// Matches accumulated so far.
    pub matches_played: u32,
    /// Sum of placement points.
    pub placement_points: u32,
    /// Sum of kill points.
    pub kill_points: u32,
    /// Sum of assist points.
    pub assist_points: u32,
    /// Sum of treasure points.
    pub treasure_points: u32,
    /// Sum of flag points.
    pub flag_points: u32,
    /// Sum of match totals.
    pub total: u32,
    /// Sum of places, for the average.
    pub place_sum: u32,
}

impl StandingRow {
    /// An empty row.
    #[must_use]
    pub fn new(team_id: TeamId, team_name: String, is_player: bool) -> Self {
        Self {
            team_id,
            team_name,
            is_player,
            matches_played: 0,
            placement_points: 0,
            kill_points: 0,
            assist_points: 0,
            treasure_points: 0,
            flag_points: 0,
            total: 0,
            place_sum: 0,
        }
    }

    /// Average place, or `None` before the first match.
    #[must_use]
    pub fn average_place(&self) -> Option<f64> {
        (self.matches_played > 0)
            .then(|| f64::from(self.place_sum) / f64::from(self.matches_played))
    }
}

/// A standing row with its current rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStanding {
    /// 1-based rank.
    pub rank: usize,
    /// Average place (`None` before the first match).
    pub average_place: Option<f64>,
    /// Cumulative totals.
    pub row: StandingRow,
}

/// Stage standings table.
///
/// Created when a stage roster is built, updated after every match, ranked
/// once the stage is complete.
///
/// # Example
///
/// ```
/// use dropzone::SimRng;
/// use royale_core::scoring::Standings;
/// use royale_core::team::TeamId;
///
/// let mut rng = SimRng::seeded(1);
/// let standings = Standings::new(
///     [(TeamId::new(1), "One".to_string(), false), (TeamId::new(2), "Two".to_string(), false)],
///     &mut rng,
/// );
/// assert_eq!(standings.ranked().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    rows: BTreeMap<TeamId, StandingRow>,
    coin: BTreeMap<TeamId, u64>,
}

impl Standings {
    /// Creates a table for a roster of `(id, name, is_player)` entries.
    ///
    /// A coin key is drawn for every team, in id order.
    pub fn new<I>(roster: I, rng: &mut SimRng) -> Self
    where
        I: IntoIterator<Item = (TeamId, String, bool)>,
    {
        let rows: BTreeMap<TeamId, StandingRow> = roster
            .into_iter()
            .map(|(id, name, is_player)| (id, StandingRow::new(id, name, is_player)))
            .collect();
        let coin = rows.keys().map(|id| (*id, rng.next_u64())).collect();
        Self { rows, coin }
    }

    /// Adds one match row to its team's totals.
    ///
    /// Rows for teams outside the roster are ignored.
    pub fn accumulate(&mut self, row: &MatchRow) {
        let Some(standing) = self.rows.get_mut(&row.team_id) else {
            tracing::warn!(team = %row.team_id, "match row for team outside standings");
            return;
        };
        standing.matches_played += 1;
        standing.placement_points += row.placement_points;
        standing.kill_points += row.kill_points;
        standing.assist_points += row.assist_points;
        standing.treasure_points += row.treasure_points;
        standing.flag_points += row.flag_points;
        standing.total += row.total;
        standing.place_sum += u32::try_from(row.place).unwrap_or(u32::MAX);
    }

    /// Adds every row of a match.
    pub fn accumulate_match(&mut self, rows: &[MatchRow]) {
        for row in rows {
            self.accumulate(row);
        }
    }

    /// Looks up one team's totals.
    #[must_use]
    pub fn row(&self, team: TeamId) -> Option<&StandingRow> {
        self.rows.get(&team)
    }

    /// Number of teams in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ranks the table.
    ///
    /// Order: total points, kills, lower average place (teams that have not
    /// played sort after those that have), assists, coin key.
    #[must_use]
    pub fn ranked(&self) -> Vec<RankedStanding> {
        let mut rows: Vec<&StandingRow> = self.rows.values().collect();
        rows.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| b.kill_points.cmp(&a.kill_points))
                .then_with(|| match (a.average_place(), b.average_place()) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
                .then_with(|| b.assist_points.cmp(&a.assist_points))
                .then_with(|| self.coin_of(a.team_id).cmp(&self.coin_of(b.team_id)))
        });
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| RankedStanding {
                rank: i + 1,
                average_place: row.average_place(),
                row: row.clone(),
            })
            .collect()
    }

    /// Team ids in rank order.
    #[must_use]
    pub fn ranked_ids(&self) -> Vec<TeamId> {
        self.ranked().into_iter().map(|r| r.row.team_id).collect()
    }

    /// Rank of one team.
    #[must_use]
    pub fn rank_of(&self, team: TeamId) -> Option<usize> {
        self.ranked()
            .into_iter()
            .find(|r| r.row.team_id == team)
            .map(|r| r.rank)
    }

    /// Best-ranked team whose total has reached `threshold`, if any.
    #[must_use]
    pub fn first_to_reach(&self, threshold: u32) -> Option<TeamId> {
        self.ranked()
            .into_iter()
            .find(|r| r.row.total >= threshold)
            .map(|r| r.row.team_id)
    }

    /// Average places of every team that has played, for match tie-breaks.
    #[must_use]
    pub fn history(&self) -> TieBreakHistory {
        let mut history = TieBreakHistory::new();
        for row in self.rows.values() {
            if let Some(avg) = row.average_place() {
                history.insert(row.team_id, avg);
            }
        }
        history
    }

    fn coin_of(&self, team: TeamId) -> u64 {
        self.coin.get(&team).copied().unwrap_or(u64::MAX)
    }
}
