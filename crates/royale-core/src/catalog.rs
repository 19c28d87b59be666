//! Static team, coach-skill, area and event catalogs.
//!
//! The catalog is a pure lookup table: engines read it to build rosters and
//! never mutate it. A built-in catalog ships with the crate; a JSON catalog
//! can replace it wholesale.
//!
//! # Team Pools
//!
//! | pool | ids | size | power |
//! |------|-----|------|-------|
//! | local | 1–19 | 19 | 30–55 |
//! | national | 101–130 | 30 | 45–70 |
//! | world | 201–230 | 30 | 60–85 |
//!
//! Id 0 is reserved for the player's team.
//!
//! # Example
//!
//! ```
//! use royale_core::catalog::Catalog;
//! use royale_core::team::TeamId;
//!
//! let catalog = Catalog::builtin();
//! assert_eq!(catalog.local.len(), 19);
//! assert!(catalog.team(TeamId::new(101)).is_ok());
//! assert!(catalog.team(TeamId::new(0)).is_err());
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use dropzone::{Area, AreaMap, Round, SimRng};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, ConfigError};
use crate::event::{EventEffect, EventTable};
use crate::power::NEUTRAL_BASE_POWER;
use crate::team::{CoachSkill, Member, Role, Team, TeamId};

/// Allowed magnitude of a single event's buff delta, in percent.
const BUFF_DELTA_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;

/// A team's base power: fixed, or drawn once per stage from a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PowerSpec {
    /// Fixed base power.
    Fixed(f64),
    /// Uniform draw in `[min, max]`.
    Range {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

impl PowerSpec {
    /// Resolves to a concrete base power.
    ///
    /// Non-finite values resolve to the neutral base power.
    pub fn resolve(&self, rng: &mut SimRng) -> f64 {
        let value = match *self {
            Self::Fixed(power) => power,
            Self::Range { min, max } => rng.uniform(min, max),
        };
        if value.is_finite() {
            value
        } else {
            NEUTRAL_BASE_POWER
        }
    }
}

/// Catalog entry for one squad member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDefinition {
    /// Squad role.
    pub role: Role,
    /// Display name.
    pub name: String,
}

/// Catalog entry for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDefinition {
    /// Team identifier.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Base power or stat range.
    pub power: PowerSpec,
    /// Squad members.
    #[serde(default)]
    pub members: Vec<MemberDefinition>,
    /// Coach skill key, if any.
    #[serde(default)]
    pub coach_skill: Option<String>,
}

impl TeamDefinition {
    /// Builds a runtime team, resolving power and coach skill.
    pub fn instantiate(&self, catalog: &Catalog, rng: &mut SimRng) -> Team {
        let members = self
            .members
            .iter()
            .map(|m| Member::new(m.role, m.name.clone()))
            .collect();
        let coach = self
            .coach_skill
            .as_deref()
            .and_then(|id| catalog.coach_skill(id))
            .cloned();
        Team::new(self.id, self.name.clone(), self.power.resolve(rng))
            .with_members(members)
            .with_coach(coach)
    }
}

/// The static catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Local-stage opponents.
    pub local: Vec<TeamDefinition>,
    /// National-stage opponents.
    pub national: Vec<TeamDefinition>,
    /// World-stage opponents.
    pub world: Vec<TeamDefinition>,
    /// Coach skills by key.
    #[serde(default)]
    pub coach_skills: Vec<CoachSkill>,
    /// Map areas; the standard map when absent.
    #[serde(default)]
    pub areas: Option<Vec<Area>>,
    /// Event pool; the standard pool when absent.
    #[serde(default)]
    pub events: Option<EventTable>,
}

const PREFIXES: [&str; 20] = [
    "Harbor", "Iron", "Crimson", "Silent", "Northern", "Velvet", "Granite", "Electric", "Midnight",
    "Golden", "Frost", "Ember", "Rapid", "Hollow", "Cobalt", "Savage", "Lunar", "Static", "Wild",
    "Obsidian",
];

const SUFFIXES: [&str; 8] = [
    "Wolves", "Vipers", "Falcons", "Rangers", "Titans", "Phantoms", "Hornets", "Sharks",
];

const CALLSIGNS: [&str; 12] = [
    "Ace", "Blitz", "Cipher", "Drift", "Echo", "Flint", "Ghost", "Havoc", "Ion", "Jolt", "Kite",
    "Lynx",
];

fn builtin_pool(first_id: u32, count: u32, min: f64, max: f64, offset: usize) -> Vec<TeamDefinition> {
    (0..count)
        .map(|n| {
            let i = offset + n as usize;
            let name = format!(
                "{} {}",
                PREFIXES[i % PREFIXES.len()],
                SUFFIXES[(i / PREFIXES.len() + i) % SUFFIXES.len()]
            );
            let members = [Role::Attacker, Role::Igl, Role::Support]
                .into_iter()
                .enumerate()
                .map(|(slot, role)| MemberDefinition {
                    role,
                    name: format!("{}{}", CALLSIGNS[(i + slot * 5) % CALLSIGNS.len()], i + 1),
                })
                .collect();
            TeamDefinition {
                id: TeamId::new(first_id + n),
                name,
                power: PowerSpec::Range { min, max },
                members,
                coach_skill: None,
            }
        })
        .collect()
}

impl Catalog {
    /// The built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            local: builtin_pool(1, 19, 30.0, 55.0, 0),
            national: builtin_pool(101, 30, 45.0, 70.0, 19),
            world: builtin_pool(201, 30, 60.0, 85.0, 49),
            coach_skills: vec![
                CoachSkill {
                    id: "steady_hand".to_string(),
                    name: "Steady Hand".to_string(),
                    multiplier: 1.05,
                    min_round: Round::ONE,
                },
                CoachSkill {
                    id: "zone_reader".to_string(),
                    name: "Zone Reader".to_string(),
                    multiplier: 1.08,
                    min_round: Round::THREE,
                },
                CoachSkill {
                    id: "endgame_caller".to_string(),
                    name: "Endgame Caller".to_string(),
                    multiplier: 1.15,
                    min_round: Round::FIVE,
                },
                CoachSkill {
                    id: "final_push".to_string(),
                    name: "Final Push".to_string(),
                    multiplier: 1.25,
                    min_round: Round::SIX,
                },
            ],
            areas: None,
            events: None,
        }
    }

    /// Parses and validates a JSON catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] for malformed JSON, otherwise as
    /// [`Catalog::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads and validates a JSON catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// wraps catalog errors as [`crate::error::RoyaleError::Catalog`].
    pub fn from_path(path: &Path) -> Result<Self, crate::error::RoyaleError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Checks id uniqueness, the reserved player id, the area map and event
    /// buff magnitudes.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = BTreeSet::new();
        for team in self.all_teams() {
            if team.id == TeamId::PLAYER {
                return Err(CatalogError::ReservedId);
            }
            if !seen.insert(team.id) {
                return Err(CatalogError::DuplicateTeam(team.id));
            }
        }
        self.area_map()?;
        if let Some(events) = &self.events {
            for event in events.iter() {
                if let EventEffect::Buff { delta, .. } = event.effect {
                    if !BUFF_DELTA_RANGE.contains(&delta.abs()) {
                        return Err(CatalogError::BuffDelta {
                            event: event.id.clone(),
                            delta,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Every team definition across the three pools.
    pub fn all_teams(&self) -> impl Iterator<Item = &TeamDefinition> + '_ {
        self.local.iter().chain(&self.national).chain(&self.world)
    }

    /// Looks up a team definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownTeam`] when no pool defines `id`.
    pub fn team(&self, id: TeamId) -> Result<&TeamDefinition, CatalogError> {
        self.all_teams()
            .find(|t| t.id == id)
            .ok_or(CatalogError::UnknownTeam(id))
    }

    /// Looks up a coach skill by key.
    #[must_use]
    pub fn coach_skill(&self, id: &str) -> Option<&CoachSkill> {
        self.coach_skills.iter().find(|c| c.id == id)
    }

    /// The area map: the catalog's areas, or the standard map.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Area`] when the catalog's areas do not cover
    /// every round pool.
    pub fn area_map(&self) -> Result<AreaMap, CatalogError> {
        match &self.areas {
            Some(areas) => Ok(AreaMap::from_areas(areas.clone())?),
            None => Ok(AreaMap::standard()),
        }
    }

    /// The event pool: the catalog's events, or the standard pool.
    #[must_use]
    pub fn event_table(&self) -> EventTable {
        self.events.clone().unwrap_or_default()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDefinition;
    use crate::team::BuffChannel;
    use dropzone::AreaError;

    mod builtin_tests {
        use super::*;

        #[test]
        fn pool_sizes_and_ids() {
            let catalog = Catalog::builtin();
            assert_eq!(catalog.local.len(), 19);
            assert_eq!(catalog.national.len(), 30);
            assert_eq!(catalog.world.len(), 30);
            assert_eq!(catalog.local[0].id, TeamId::new(1));
            assert_eq!(catalog.national[29].id, TeamId::new(130));
            assert_eq!(catalog.world[0].id, TeamId::new(201));
            assert!(catalog.validate().is_ok());
        }

        #[test]
        fn every_team_has_three_roles() {
            for team in Catalog::builtin().all_teams() {
                let roles: Vec<Role> = team.members.iter().map(|m| m.role).collect();
                assert_eq!(roles, vec![Role::Attacker, Role::Igl, Role::Support]);
                assert!(!team.name.is_empty());
            }
        }

        #[test]
        fn instantiate_resolves_range() {
            let catalog = Catalog::builtin();
            let mut rng = SimRng::seeded(3);
            for def in &catalog.world {
                let team = def.instantiate(&catalog, &mut rng);
                assert!((60.0..=85.0).contains(&team.base_power));
                assert_eq!(team.members.len(), 3);
            }
        }

        #[test]
        fn coach_skill_lookup() {
            let catalog = Catalog::builtin();
            let skill = catalog.coach_skill("endgame_caller").unwrap();
            assert_eq!(skill.min_round, Round::FIVE);
            assert!(catalog.coach_skill("missing").is_none());
        }
    }

    mod json_tests {
        use super::*;

        const SMALL: &str = r#"{
            "local": [
                { "id": 1, "name": "Fixed Five", "power": 55.0,
                  "members": [{ "role": "attacker", "name": "a" }],
                  "coach_skill": "boost" }
            ],
            "national": [
                { "id": 2, "name": "Ranged", "power": { "min": 40.0, "max": 41.0 } }
            ],
            "world": [],
            "coach_skills": [
                { "id": "boost", "name": "Boost", "multiplier": 1.1, "min_round": 5 }
            ]
        }"#;

        #[test]
        fn parses_both_power_forms() {
            let catalog = Catalog::from_json_str(SMALL).unwrap();
            assert_eq!(catalog.local[0].power, PowerSpec::Fixed(55.0));
            assert_eq!(
                catalog.national[0].power,
                PowerSpec::Range { min: 40.0, max: 41.0 }
            );
            let mut rng = SimRng::seeded(1);
            let team = catalog.local[0].instantiate(&catalog, &mut rng);
            assert!((team.base_power - 55.0).abs() < f64::EPSILON);
            assert_eq!(team.coach.unwrap().min_round, Round::FIVE);
        }

        #[test]
        fn reserved_and_duplicate_ids_rejected() {
            let reserved = SMALL.replace(r#""id": 1,"#, r#""id": 0,"#);
            assert!(matches!(
                Catalog::from_json_str(&reserved),
                Err(CatalogError::ReservedId)
            ));
            let duplicate = SMALL.replace(r#""id": 2,"#, r#""id": 1,"#);
            assert!(matches!(
                Catalog::from_json_str(&duplicate),
                Err(CatalogError::DuplicateTeam(id)) if id == TeamId::new(1)
            ));
        }

        #[test]
        fn unknown_team_lookup() {
            let catalog = Catalog::from_json_str(SMALL).unwrap();
            assert!(matches!(
                catalog.team(TeamId::new(9)),
                Err(CatalogError::UnknownTeam(_))
            ));
        }

        #[test]
        fn incomplete_area_list_rejected() {
            let mut catalog = Catalog::builtin();
            catalog.areas = Some(vec![Area {
                id: dropzone::AreaId::new(1),
                name: "Only".to_string(),
                background_asset: "only.png".to_string(),
            }]);
            assert!(matches!(
                catalog.validate(),
                Err(CatalogError::Area(AreaError::UnknownArea(2)))
            ));
        }

        #[test]
        fn oversized_buff_delta_rejected() {
            let json = SMALL.replace(
                r#""coach_skills""#,
                r#""events": [
                    { "id": "overdrive", "name": "Overdrive", "flavor": "Too much.",
                      "weight": 1, "effect": { "kind": "buff", "channel": "aim", "delta": 25.0 } }
                ],
                "coach_skills""#,
            );
            assert!(matches!(
                Catalog::from_json_str(&json),
                Err(CatalogError::BuffDelta { ref event, delta }) if event == "overdrive" && delta > 24.0
            ));

            let mut catalog = Catalog::builtin();
            catalog.events = Some(EventTable::new(vec![EventDefinition {
                id: "flat".to_string(),
                name: "Flat".to_string(),
                flavor: String::new(),
                weight: 1,
                effect: EventEffect::Buff {
                    channel: BuffChannel::Mental,
                    delta: -0.5,
                },
            }]));
            assert!(matches!(catalog.validate(), Err(CatalogError::BuffDelta { .. })));
        }

        #[test]
        fn standard_events_within_buff_range() {
            let mut catalog = Catalog::builtin();
            catalog.events = Some(EventTable::standard());
            assert!(catalog.validate().is_ok());
        }

        #[test]
        fn non_finite_power_is_neutral() {
            let mut rng = SimRng::seeded(1);
            assert!((PowerSpec::Fixed(f64::NAN).resolve(&mut rng) - NEUTRAL_BASE_POWER).abs() < f64::EPSILON);
        }
    }
}
