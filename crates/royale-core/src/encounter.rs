//! Per-round encounter selection.
//!
//! # Algorithm
//!
//! For each round the builder fills a fixed number of slots (4, 4, 4, 4, 2, 1
//! by default) with pairings of alive teams:
//!
//! 1. **Player involvement.** In round 1 the player must fight when its drop
//!    area was contested; otherwise (and in every later round) the player
//!    fights with the round's involvement probability. Round 6 defaults to
//!    1.0. The opponent is drawn uniformly from alive teams sharing the
//!    player's area, or from every other alive team when the area is empty.
//!    Opponent selection never considers neighbouring areas.
//! 2. **Random fill.** Remaining slots pair unused alive teams uniformly at
//!    random. A player that was not selected stays out of the fill unless
//!    fewer than two other teams are left, in which case it is drafted.
//! 3. **Fallback.** When exactly one unused team remains and slots are still
//!    open, it is paired with a team that already has an encounter this round.
//!    The encounter is marked [`Encounter::fallback`]. This is the only case
//!    in which a team appears twice in one round.
//!
//! Running out of teams simply leaves slots empty.

use std::collections::BTreeSet;

use dropzone::{Round, SimRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MatchConfig;
use crate::team::{Team, TeamId};

/// One scheduled pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    /// Round of the pairing.
    pub round: Round,
    /// First side.
    pub team_a: TeamId,
    /// Second side.
    pub team_b: TeamId,
    /// Whether the player's team is one of the sides.
    pub involves_player: bool,
    /// Whether this pairing reuses a team already paired this round.
    pub fallback: bool,
}

impl Encounter {
    /// Whether `team` is one of the sides.
    #[must_use]
    pub fn involves(&self, team: TeamId) -> bool {
        self.team_a == team || self.team_b == team
    }
}

/// Builds encounters from the per-round slot and involvement tables.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterBuilder {
    slots: [usize; Round::COUNT],
    involvement: [f64; Round::COUNT],
}

impl EncounterBuilder {
    /// Creates a builder from a match configuration.
    #[must_use]
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            slots: config.encounter_slots,
            involvement: config.involvement,
        }
    }

    /// Probability that the player fights in `round`.
    #[must_use]
    pub fn involvement_probability(&self, round: Round, player_contested: bool) -> f64 {
        if round == Round::ONE && player_contested {
            1.0
        } else {
            self.involvement[round.index()]
        }
    }

    /// Builds this round's encounters.
    ///
    /// # Arguments
    ///
    /// * `teams` - Every team of the match; eliminated teams are skipped
    /// * `round` - Current round
    /// * `player_contested` - Whether the player's round-1 drop area held
    ///   another team (ignored after round 1)
    /// * `rng` - Match RNG
    pub fn build_encounters(
        &self,
        teams: &[Team],
        round: Round,
        player_contested: bool,
        rng: &mut SimRng,
    ) -> Vec<Encounter> {
        let slots = self.slots[round.index()];
        let alive: Vec<&Team> = teams.iter().filter(|t| t.is_alive()).collect();
        let player = alive.iter().find(|t| t.is_player).map(|t| t.id);

        let mut encounters = Vec::with_capacity(slots);
        let mut used: BTreeSet<TeamId> = BTreeSet::new();

        if let Some(player_id) = player {
            let p = self.involvement_probability(round, player_contested);
            if slots > 0 && alive.len() >= 2 && rng.chance(p) {
                if let Some(opponent) = pick_player_opponent(&alive, player_id, rng) {
                    used.insert(player_id);
                    used.insert(opponent);
                    encounters.push(Encounter {
                        round,
                        team_a: player_id,
                        team_b: opponent,
                        involves_player: true,
                        fallback: false,
                    });
                }
            }
        }

        while encounters.len() < slots {
            let mut pool: Vec<TeamId> = alive
                .iter()
                .filter(|t| !t.is_player && !used.contains(&t.id))
                .map(|t| t.id)
                .collect();
            if pool.len() < 2 {
                if let Some(player_id) = player.filter(|id| !used.contains(id)) {
                    pool.push(player_id);
                }
            }

            match pool.len() {
                0 => break,
                1 => {
                    let lone = pool[0];
                    let partners: Vec<TeamId> = used.iter().copied().collect();
                    let Some(&partner) = rng.pick(&partners) else {
                        break;
                    };
                    used.insert(lone);
                    encounters.push(Encounter {
                        round,
                        team_a: lone,
                        team_b: partner,
                        involves_player: Some(lone) == player || Some(partner) == player,
                        fallback: true,
                    });
                }
                _ => {
                    let (a, b) = draw_pair(&mut pool, rng);
                    used.insert(a);
                    used.insert(b);
                    encounters.push(Encounter {
                        round,
                        team_a: a,
                        team_b: b,
                        involves_player: Some(a) == player || Some(b) == player,
                        fallback: false,
                    });
                }
            }
        }

        if encounters.len() < slots {
            debug!(
                round = round.get(),
                slots,
                built = encounters.len(),
                alive = alive.len(),
                "encounter slots left empty"
            );
        }
        encounters
    }
}

impl Default for EncounterBuilder {
    fn default() -> Self {
        Self::new(&MatchConfig::default())
    }
}

fn pick_player_opponent(alive: &[&Team], player: TeamId, rng: &mut SimRng) -> Option<TeamId> {
    let player_area = alive.iter().find(|t| t.id == player).and_then(|t| t.area);
    let others: Vec<TeamId> = alive
        .iter()
        .filter(|t| t.id != player)
        .map(|t| t.id)
        .collect();
    let same_area: Vec<TeamId> = alive
        .iter()
        .filter(|t| t.id != player && player_area.is_some() && t.area == player_area)
        .map(|t| t.id)
        .collect();
    if same_area.is_empty() {
        rng.pick(&others).copied()
    } else {
        rng.pick(&same_area).copied()
    }
}

/// Removes and returns two distinct ids. `pool` must hold at least two.
fn draw_pair(pool: &mut Vec<TeamId>, rng: &mut SimRng) -> (TeamId, TeamId) {
    let first = rng.index(pool.len()).unwrap_or(0);
    let a = pool.swap_remove(first);
    let second = rng.index(pool.len()).unwrap_or(0);
    let b = pool.swap_remove(second);
    (a, b)
}
