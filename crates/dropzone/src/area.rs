//! The 25-area drop map and its per-round candidate pools.
//!
//! The map is a fixed partition:
//!
//! | rounds | pool |
//! |--------|------|
//! | 1–2    | areas 1–16 |
//! | 3      | areas 17–20 |
//! | 4      | areas 21–22 |
//! | 5      | areas 23–24 |
//! | 6      | area 25 |
//!
//! # Relocation Policy
//!
//! Between rounds every surviving team is moved to a uniformly random area of
//! the next round's pool. There is no spatial continuity and no adjacency: a
//! team's current area has no influence on where it lands next.
//!
//! # Drop Overlap
//!
//! The round-1 drop assigns the first 16 teams (in shuffled order) one-to-one
//! onto the 16 early areas, then drops every further team onto an area drawn
//! with replacement from the same pool. With 20 teams at least one area always
//! holds two or more teams; the contested-drop rule depends on that.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::round::Round;
use crate::rng::SimRng;

/// Number of areas on the standard map.
pub const AREA_COUNT: u8 = 25;

/// Identifier of a map area, `1..=25` on the standard map.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaId(u8);

impl AreaId {
    /// Creates an area id from its raw number.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AreaId({})", self.0)
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when building or querying an area map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AreaError {
    /// An area id is not present on the map.
    #[error("unknown area id {0}")]
    UnknownArea(u8),
    /// The same area id was defined twice.
    #[error("area id {0} defined more than once")]
    DuplicateArea(u8),
    /// A round number outside `1..=6`.
    #[error("round {0} is outside 1..=6")]
    RoundOutOfRange(u8),
}

/// Static definition of one map area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Area identifier.
    pub id: AreaId,
    /// Display name.
    pub name: String,
    /// Asset key of the background image (resolved by the presentation layer).
    pub background_asset: String,
}

/// A team's landing spot from the initial drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPlacement<T> {
    /// The dropped team.
    pub team: T,
    /// The area it landed in.
    pub area: AreaId,
}

const STANDARD_NAMES: [&str; AREA_COUNT as usize] = [
    "Saltmarsh Docks",
    "Old Quarry",
    "Pine Ridge",
    "Relay Station",
    "Ferry Terminal",
    "Grain Silos",
    "Hillside Chapel",
    "Copper Mine",
    "Lighthouse Point",
    "Train Yard",
    "Water Works",
    "Radio Tower",
    "Fishing Village",
    "Orchard Farm",
    "Cargo Port",
    "Airstrip",
    "Central Market",
    "Power Plant",
    "Military Base",
    "Stadium",
    "Research Lab",
    "Old Town",
    "Dam Control",
    "Cliff Fort",
    "Final Circle",
];

/// The drop map: area definitions plus the fixed per-round candidate pools.
///
/// # Example
///
/// ```
/// use dropzone::{AreaMap, Round};
///
/// let map = AreaMap::standard();
/// assert_eq!(map.candidate_areas(Round::ONE).len(), 16);
/// assert_eq!(map.candidate_areas(Round::SIX).len(), 1);
/// assert_eq!(map.area(map.candidate_areas(Round::SIX)[0]).unwrap().name, "Final Circle");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaMap {
    areas: BTreeMap<AreaId, Area>,
    pools: [Vec<AreaId>; Round::COUNT],
}

impl AreaMap {
    /// The standard 25-area map with built-in names.
    #[must_use]
    pub fn standard() -> Self {
        let areas = STANDARD_NAMES
            .iter()
            .zip(1..=AREA_COUNT)
            .map(|(name, id)| Area {
                id: AreaId(id),
                name: (*name).to_string(),
                background_asset: format!("areas/area_{id:02}.png"),
            })
            .map(|area| (area.id, area))
            .collect();
        Self {
            areas,
            pools: Self::standard_pools(),
        }
    }

    /// Builds a map from catalog area definitions, keeping the standard pools.
    ///
    /// # Errors
    ///
    /// Returns [`AreaError::DuplicateArea`] when an id appears twice and
    /// [`AreaError::UnknownArea`] when a pool area has no definition.
    pub fn from_areas(definitions: Vec<Area>) -> Result<Self, AreaError> {
        let mut areas = BTreeMap::new();
        for area in definitions {
            let id = area.id;
            if areas.insert(id, area).is_some() {
                return Err(AreaError::DuplicateArea(id.get()));
            }
        }
        let pools = Self::standard_pools();
        if let Some(missing) = pools
            .iter()
            .flatten()
            .find(|id| !areas.contains_key(*id))
        {
            return Err(AreaError::UnknownArea(missing.get()));
        }
        Ok(Self { areas, pools })
    }

    fn standard_pools() -> [Vec<AreaId>; Round::COUNT] {
        let span = |lo: u8, hi: u8| (lo..=hi).map(AreaId).collect::<Vec<_>>();
        [
            span(1, 16),
            span(1, 16),
            span(17, 20),
            span(21, 22),
            span(23, 24),
            span(25, 25),
        ]
    }

    /// Looks up an area definition.
    ///
    /// # Errors
    ///
    /// Returns [`AreaError::UnknownArea`] when the id is not on this map.
    pub fn area(&self, id: AreaId) -> Result<&Area, AreaError> {
        self.areas.get(&id).ok_or(AreaError::UnknownArea(id.get()))
    }

    /// Iterates area definitions in id order.
    pub fn areas(&self) -> impl Iterator<Item = &Area> + '_ {
        self.areas.values()
    }

    /// Candidate areas a team may occupy during `round`.
    #[must_use]
    pub fn candidate_areas(&self, round: Round) -> &[AreaId] {
        &self.pools[round.index()]
    }

    /// Places teams for the round-1 drop.
    ///
    /// Team order is shuffled; the first `pool.len()` teams are assigned
    /// one-to-one to the round-1 pool, and every remaining team lands on an
    /// area drawn with replacement from the same pool. Placements are returned
    /// in shuffled order.
    pub fn initial_drop<T: Copy>(&self, rng: &mut SimRng, teams: &[T]) -> Vec<DropPlacement<T>> {
        let pool = self.candidate_areas(Round::ONE);
        let mut order: Vec<T> = teams.to_vec();
        rng.shuffle(&mut order);

        let mut placements = Vec::with_capacity(order.len());
        for (i, team) in order.into_iter().enumerate() {
            let area = match pool.get(i) {
                Some(area) => *area,
                None => match rng.pick(pool) {
                    Some(area) => *area,
                    None => break,
                },
            };
            placements.push(DropPlacement { team, area });
        }
        tracing::trace!(teams = placements.len(), "initial drop placed");
        placements
    }

    /// Draws a new area for a surviving team entering `round`.
    ///
    /// Pure uniform draw from the round's pool; see the module docs for the
    /// relocation policy.
    pub fn relocate(&self, rng: &mut SimRng, round: Round) -> AreaId {
        let pool = self.candidate_areas(round);
        rng.pick(pool).copied().unwrap_or(AreaId(AREA_COUNT))
    }

    /// Areas holding two or more teams in a placement list.
    #[must_use]
    pub fn contested_areas<T>(placements: &[DropPlacement<T>]) -> BTreeSet<AreaId> {
        let mut counts: BTreeMap<AreaId, usize> = BTreeMap::new();
        for placement in placements {
            *counts.entry(placement.area).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n >= 2)
            .map(|(area, _)| area)
            .collect()
    }
}

impl Default for AreaMap {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod pool_tests {
        use super::*;

        #[test]
        fn pools_partition_the_map() {
            let map = AreaMap::standard();
            let mut seen = BTreeSet::new();
            for round in [Round::TWO, Round::THREE, Round::FOUR, Round::FIVE, Round::SIX] {
                for id in map.candidate_areas(round) {
                    assert!(seen.insert(*id), "area {id} appears in two pools");
                }
            }
            assert_eq!(seen.len(), usize::from(AREA_COUNT));
            assert_eq!(map.candidate_areas(Round::ONE), map.candidate_areas(Round::TWO));
        }

        #[test]
        fn pool_sizes() {
            let map = AreaMap::standard();
            let sizes: Vec<usize> = Round::ALL
                .iter()
                .map(|r| map.candidate_areas(*r).len())
                .collect();
            assert_eq!(sizes, vec![16, 16, 4, 2, 2, 1]);
        }

        #[test]
        fn unknown_area_lookup_fails() {
            let map = AreaMap::standard();
            assert_eq!(map.area(AreaId::new(26)), Err(AreaError::UnknownArea(26)));
            assert!(map.area(AreaId::new(25)).is_ok());
        }
    }

    mod catalog_tests {
        use super::*;

        #[test]
        fn from_areas_rejects_duplicates() {
            let mut defs: Vec<Area> = AreaMap::standard().areas().cloned().collect();
            defs.push(defs[0].clone());
            assert_eq!(
                AreaMap::from_areas(defs).unwrap_err(),
                AreaError::DuplicateArea(1)
            );
        }

        #[test]
        fn from_areas_rejects_missing_pool_area() {
            let defs: Vec<Area> = AreaMap::standard()
                .areas()
                .filter(|a| a.id.get() != 21)
                .cloned()
                .collect();
            assert_eq!(
                AreaMap::from_areas(defs).unwrap_err(),
                AreaError::UnknownArea(21)
            );
        }

        #[test]
        fn from_areas_keeps_custom_names() {
            let defs: Vec<Area> = AreaMap::standard()
                .areas()
                .map(|a| Area {
                    name: format!("Zone {}", a.id),
                    ..a.clone()
                })
                .collect();
            let map = AreaMap::from_areas(defs).unwrap();
            assert_eq!(map.area(AreaId::new(3)).unwrap().name, "Zone 3");
        }
    }

    mod drop_tests {
        use super::*;

        #[test]
        fn twenty_teams_always_overlap() {
            let map = AreaMap::standard();
            for seed in 0..200 {
                let mut rng = SimRng::seeded(seed);
                let teams: Vec<u32> = (0..20).collect();
                let placements = map.initial_drop(&mut rng, &teams);
                assert_eq!(placements.len(), 20);
                assert!(!AreaMap::contested_areas(&placements).is_empty());
            }
        }

        #[test]
        fn first_sixteen_cover_every_early_area() {
            let map = AreaMap::standard();
            let mut rng = SimRng::seeded(17);
            let teams: Vec<u32> = (0..20).collect();
            let placements = map.initial_drop(&mut rng, &teams);
            let covered: BTreeSet<AreaId> = placements[..16].iter().map(|p| p.area).collect();
            assert_eq!(covered.len(), 16);
            for p in &placements[16..] {
                assert!(map.candidate_areas(Round::ONE).contains(&p.area));
            }
        }

        #[test]
        fn every_team_is_placed_once() {
            let map = AreaMap::standard();
            let mut rng = SimRng::seeded(3);
            let teams: Vec<u32> = (100..120).collect();
            let mut placed: Vec<u32> = map
                .initial_drop(&mut rng, &teams)
                .into_iter()
                .map(|p| p.team)
                .collect();
            placed.sort_unstable();
            assert_eq!(placed, teams);
        }

        #[test]
        fn small_lobby_has_no_overlap() {
            let map = AreaMap::standard();
            let mut rng = SimRng::seeded(9);
            let placements = map.initial_drop(&mut rng, &[1u32, 2, 3]);
            assert!(AreaMap::contested_areas(&placements).is_empty());
        }

        #[test]
        fn relocate_stays_in_pool() {
            let map = AreaMap::standard();
            let mut rng = SimRng::seeded(21);
            for round in Round::ALL {
                for _ in 0..50 {
                    let area = map.relocate(&mut rng, round);
                    assert!(map.candidate_areas(round).contains(&area));
                }
            }
        }
    }
}
