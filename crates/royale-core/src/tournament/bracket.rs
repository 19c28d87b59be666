//! Single-elimination championship bracket.
//!
//! Seeds are placed so the top seeds meet as late as possible (1v8, 4v5,
//! 2v7, 3v6 for eight teams). Every tie is a series of head-to-head duels
//! resolved at final-round power; the first team to a majority advances.

use std::collections::BTreeMap;

use dropzone::{Round, SimRng};
use serde::{Deserialize, Serialize};

use crate::battle::BattleResolver;
use crate::scoring::{RankedStanding, StandingRow};
use crate::team::{Team, TeamId};

/// Bracket positions of 1-based seeds for a bracket of `size` teams.
///
/// `size` is rounded up to a power of two.
///
/// # Example
///
/// ```
/// use royale_core::tournament::bracket::seeding_order;
///
/// assert_eq!(seeding_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
/// ```
#[must_use]
pub fn seeding_order(size: usize) -> Vec<usize> {
    let size = size.max(1).next_power_of_two();
    let mut order = vec![1];
    while order.len() < size {
        let n = order.len() * 2;
        order = order.iter().flat_map(|&s| [s, n + 1 - s]).collect();
    }
    order
}

/// Label of a bracket round by the number of teams still in it.
#[must_use]
pub fn round_label(entrants: usize) -> String {
    match entrants {
        2 => "final".to_string(),
        4 => "semifinal".to_string(),
        8 => "quarterfinal".to_string(),
        n => format!("round of {n}"),
    }
}

/// Result of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesResult {
    /// Higher seed.
    pub team_a: TeamId,
    /// Lower seed.
    pub team_b: TeamId,
    /// Duels won by `team_a`.
    pub wins_a: u32,
    /// Duels won by `team_b`.
    pub wins_b: u32,
    /// Series winner.
    pub winner: TeamId,
}

/// Plays a best-of-`length` series between `a` and `b`.
///
/// An even `length` is rounded up so the series always has a winner.
pub fn play_series(
    resolver: &BattleResolver,
    a: &Team,
    b: &Team,
    length: u32,
    rng: &mut SimRng,
) -> SeriesResult {
    let needed = length.max(1) / 2 + 1;
    let (mut wins_a, mut wins_b) = (0, 0);
    while wins_a < needed && wins_b < needed {
        if resolver.duel(a, b, Round::SIX, rng) == a.id {
            wins_a += 1;
        } else {
            wins_b += 1;
        }
    }
    SeriesResult {
        team_a: a.id,
        team_b: b.id,
        wins_a,
        wins_b,
        winner: if wins_a > wins_b { a.id } else { b.id },
    }
}

/// Progress of a bracket, one series at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    seeds: BTreeMap<TeamId, usize>,
    /// Bracket positions of the round being played; `None` is an empty slot.
    current: Vec<Option<TeamId>>,
    winners: Vec<Option<TeamId>>,
    next_pair: usize,
    round_index: usize,
    /// `(bracket round index, seed, team)` of every eliminated team.
    eliminated: Vec<(usize, usize, TeamId)>,
    duels_won: BTreeMap<TeamId, u32>,
    series_played: BTreeMap<TeamId, u32>,
    champion: Option<TeamId>,
}

impl Bracket {
    /// Seeds a bracket from `seeded`, best first.
    ///
    /// The field should be a power of two; missing positions give the
    /// paired seed a bye.
    #[must_use]
    pub fn new(seeded: &[TeamId]) -> Self {
        let seeds: BTreeMap<TeamId, usize> =
            seeded.iter().enumerate().map(|(i, id)| (*id, i + 1)).collect();
        let current = seeding_order(seeded.len())
            .into_iter()
            .map(|seed| seeded.get(seed - 1).copied())
            .collect();

        let mut bracket = Self {
            seeds,
            current,
            winners: Vec::new(),
            next_pair: 0,
            round_index: 0,
            eliminated: Vec::new(),
            duels_won: seeded.iter().map(|id| (*id, 0)).collect(),
            series_played: seeded.iter().map(|id| (*id, 0)).collect(),
            champion: None,
        };
        bracket.settle();
        bracket
    }

    /// Next pairing to play, higher seed first.
    #[must_use]
    pub fn next_pairing(&self) -> Option<(TeamId, TeamId)> {
        let (a, b) = self.pair(self.next_pair)?;
        let (a, b) = (a?, b?);
        if self.seed(a) <= self.seed(b) {
            Some((a, b))
        } else {
            Some((b, a))
        }
    }

    /// Label of the round the next pairing belongs to.
    #[must_use]
    pub fn current_label(&self) -> String {
        round_label(self.current.len())
    }

    /// Series still to play, including later rounds.
    #[must_use]
    pub fn remaining_series(&self) -> usize {
        if self.champion.is_some() {
            return 0;
        }
        let waiting = self
            .current
            .iter()
            .skip(self.next_pair * 2)
            .chain(&self.winners)
            .flatten()
            .count();
        waiting.saturating_sub(1)
    }

    /// Records a played series.
    ///
    /// Results that do not match the next pairing are ignored.
    pub fn record(&mut self, result: &SeriesResult) {
        let Some((a, b)) = self.next_pairing() else {
            return;
        };
        let forward = (result.team_a, result.team_b) == (a, b);
        let reverse = (result.team_b, result.team_a) == (a, b);
        if !(forward || reverse) || (result.winner != a && result.winner != b) {
            return;
        }
        let loser = if result.winner == a { b } else { a };
        *self.duels_won.entry(result.team_a).or_insert(0) += result.wins_a;
        *self.duels_won.entry(result.team_b).or_insert(0) += result.wins_b;
        *self.series_played.entry(a).or_insert(0) += 1;
        *self.series_played.entry(b).or_insert(0) += 1;

        self.eliminated
            .push((self.round_index, self.seed(loser), loser));
        self.winners.push(Some(result.winner));
        self.next_pair += 1;
        self.settle();
    }

    /// Whether the champion is decided.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.champion.is_some()
    }

    /// The champion, once decided.
    #[must_use]
    pub fn champion(&self) -> Option<TeamId> {
        self.champion
    }

    /// Final order: champion, runner-up, then losers of earlier rounds by
    /// round (later first) and seed.
    #[must_use]
    pub fn final_order(&self) -> Vec<TeamId> {
        let mut out: Vec<(usize, usize, TeamId)> = self.eliminated.clone();
        out.sort_by(|x, y| y.0.cmp(&x.0).then(x.1.cmp(&y.1)));
        self.champion
            .into_iter()
            .chain(out.into_iter().map(|(_, _, id)| id))
            .collect()
    }

    /// Standings in final order; `total` counts duels won.
    #[must_use]
    pub fn standings(&self, teams: &[Team]) -> Vec<RankedStanding> {
        self.final_order()
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let (name, is_player) = teams
                    .iter()
                    .find(|t| t.id == id)
                    .map_or_else(|| (id.to_string(), false), |t| (t.name.clone(), t.is_player));
                let mut row = StandingRow::new(id, name, is_player);
                row.total = self.duels_won.get(&id).copied().unwrap_or(0);
                row.matches_played = self.series_played.get(&id).copied().unwrap_or(0);
                RankedStanding {
                    rank: i + 1,
                    average_place: None,
                    row,
                }
            })
            .collect()
    }

    fn seed(&self, id: TeamId) -> usize {
        self.seeds.get(&id).copied().unwrap_or(usize::MAX)
    }

    fn pair(&self, index: usize) -> Option<(Option<TeamId>, Option<TeamId>)> {
        let a = *self.current.get(index * 2)?;
        let b = *self.current.get(index * 2 + 1)?;
        Some((a, b))
    }

    /// Advances byes and promotes winners until a real pairing is waiting
    /// or the champion is decided.
    fn settle(&mut self) {
        loop {
            while let Some((a, b)) = self.pair(self.next_pair) {
                if a.is_some() && b.is_some() {
                    return;
                }
                self.winners.push(a.or(b));
                self.next_pair += 1;
            }
            if self.current.len() == 1 {
                self.winners = std::mem::take(&mut self.current);
            }
            if self.winners.len() <= 1 {
                self.champion = self.winners.first().copied().flatten();
                self.current.clear();
                self.winners.clear();
                self.next_pair = 0;
                return;
            }
            self.current = std::mem::take(&mut self.winners);
            self.next_pair = 0;
            self.round_index += 1;
        }
    }
}
