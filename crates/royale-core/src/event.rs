//! Random per-round events.
//!
//! Each round rolls a fixed number of events (1, 2, 2, 2, 2, 0 by default).
//! Every roll:
//!
//! 1. draws an event definition by weight, without replacement within the
//!    round, so one event never fires twice in the same round;
//! 2. picks a target uniformly among the teams still alive;
//! 3. applies the effect to the target's buffs, treasure or flag count;
//! 4. attaches a narrative for the player's team only.
//!
//! Events never decide a fight directly; they only shift the inputs of the
//! power model. When fewer teams are alive than the planned count, rolling
//! stops early.

use dropzone::{Round, SimRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::team::{BuffChannel, Team, TeamId};

/// Mechanical effect of an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEffect {
    /// Additive percentage delta on one buff channel.
    Buff {
        /// Channel to modify.
        channel: BuffChannel,
        /// Delta in percent.
        delta: f64,
    },
    /// +1 treasure.
    Treasure,
    /// +1 flag.
    Flag,
}

impl EventEffect {
    /// Applies the effect to a team. Buffs are clamped to `±buff_limit`.
    pub fn apply(&self, team: &mut Team, buff_limit: f64) {
        match *self {
            Self::Buff { channel, delta } => team.buffs.apply(channel, delta, buff_limit),
            Self::Treasure => team.treasure = team.treasure.saturating_add(1),
            Self::Flag => team.flag = team.flag.saturating_add(1),
        }
    }
}

/// Static definition of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Catalog key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flavor line shown to the player.
    pub flavor: String,
    /// Relative draw weight; zero disables the event.
    pub weight: u32,
    /// Mechanical effect.
    pub effect: EventEffect,
}

impl EventDefinition {
    fn new(id: &str, name: &str, flavor: &str, weight: u32, effect: EventEffect) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            flavor: flavor.to_string(),
            weight,
            effect,
        }
    }
}

/// The weighted event pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTable {
    events: Vec<EventDefinition>,
}

impl EventTable {
    /// Creates a table from definitions.
    #[must_use]
    pub fn new(events: Vec<EventDefinition>) -> Self {
        Self { events }
    }

    /// The built-in event pool.
    #[must_use]
    pub fn standard() -> Self {
        let buff = |channel, delta| EventEffect::Buff { channel, delta };
        Self::new(vec![
            EventDefinition::new(
                "focused_warmup",
                "Focused Warmup",
                "Crosshairs settle a little faster.",
                10,
                buff(BuffChannel::Aim, 3.0),
            ),
            EventDefinition::new(
                "steady_hands",
                "Steady Hands",
                "Every shot lands where it was meant to.",
                4,
                buff(BuffChannel::Aim, 5.0),
            ),
            EventDefinition::new(
                "jammed_rifle",
                "Jammed Rifle",
                "A magazine sticks at the worst moment.",
                8,
                buff(BuffChannel::Aim, -3.0),
            ),
            EventDefinition::new(
                "pep_talk",
                "Pep Talk",
                "The IGL keeps everyone calm.",
                8,
                buff(BuffChannel::Mental, 4.0),
            ),
            EventDefinition::new(
                "crowd_roar",
                "Crowd Roar",
                "The stream chat is on their side.",
                6,
                buff(BuffChannel::Mental, 1.0),
            ),
            EventDefinition::new(
                "tilted_comms",
                "Tilted Comms",
                "Callouts start overlapping.",
                6,
                buff(BuffChannel::Mental, -4.0),
            ),
            EventDefinition::new(
                "second_wind",
                "Second Wind",
                "Fresh legs for the next rotation.",
                8,
                buff(BuffChannel::Agility, 2.0),
            ),
            EventDefinition::new(
                "twisted_ankle",
                "Twisted Ankle",
                "A bad landing slows the squad down.",
                4,
                buff(BuffChannel::Agility, -5.0),
            ),
            EventDefinition::new(
                "supply_crate",
                "Supply Crate",
                "A crate drops right on top of them.",
                10,
                EventEffect::Treasure,
            ),
            EventDefinition::new(
                "hidden_cache",
                "Hidden Cache",
                "Someone checks behind the right wall.",
                6,
                EventEffect::Treasure,
            ),
            EventDefinition::new(
                "flag_capture",
                "Flag Capture",
                "They plant the team flag on high ground.",
                5,
                EventEffect::Flag,
            ),
        ])
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the table has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Definition at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EventDefinition> {
        self.events.get(index)
    }

    /// Iterates definitions.
    pub fn iter(&self) -> impl Iterator<Item = &EventDefinition> + '_ {
        self.events.iter()
    }

    fn weights(&self) -> Vec<u32> {
        self.events.iter().map(|e| e.weight).collect()
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Three-line text shown when an event hits the player's team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    /// Banner line.
    pub header: String,
    /// Event name.
    pub title: String,
    /// Flavor line.
    pub flavor: String,
}

/// Result of one event roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Round the event fired in.
    pub round: Round,
    /// Event catalog key.
    pub event_id: String,
    /// Target team.
    pub team_id: TeamId,
    /// Applied effect.
    pub effect: EventEffect,
    /// Player-visible text; `None` for non-player targets.
    pub narrative: Option<Narrative>,
}

/// Rolls and applies round events.
#[derive(Debug, Clone)]
pub struct EventEngine {
    table: EventTable,
    buff_limit: f64,
}

impl EventEngine {
    /// Creates an engine over `table` with buffs clamped to `±buff_limit`.
    #[must_use]
    pub fn new(table: EventTable, buff_limit: f64) -> Self {
        Self { table, buff_limit }
    }

    /// The event pool.
    #[must_use]
    pub fn table(&self) -> &EventTable {
        &self.table
    }

    /// Rolls up to `planned` events for `round` and applies them to `teams`.
    ///
    /// The count is capped by the number of alive teams and by the number of
    /// positive-weight events; the cap is never an error.
    pub fn roll_round_events(
        &self,
        teams: &mut [Team],
        round: Round,
        planned: usize,
        rng: &mut SimRng,
    ) -> Vec<EventOutcome> {
        let alive: Vec<usize> = teams
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_alive())
            .map(|(i, _)| i)
            .collect();
        let count = planned.min(alive.len());
        if count == 0 {
            return Vec::new();
        }

        let drawn = rng.weighted_sample(&self.table.weights(), count);
        if drawn.len() < count {
            debug!(
                round = round.get(),
                planned = count,
                available = drawn.len(),
                "event pool exhausted"
            );
        }

        let mut outcomes = Vec::with_capacity(drawn.len());
        for event_index in drawn {
            let Some(event) = self.table.get(event_index) else {
                continue;
            };
            let Some(&team_index) = rng.pick(&alive) else {
                break;
            };
            let team = &mut teams[team_index];
            event.effect.apply(team, self.buff_limit);
            trace!(round = round.get(), event = %event.id, team = %team.id, "event applied");

            let narrative = team.is_player.then(|| Narrative {
                header: format!("Round {} event", round.get()),
                title: event.name.clone(),
                flavor: event.flavor.clone(),
            });
            outcomes.push(EventOutcome {
                round,
                event_id: event.id.clone(),
                team_id: team.id,
                effect: event.effect,
                narrative,
            });
        }
        outcomes
    }
}

impl Default for EventEngine {
    fn default() -> Self {
        Self::new(EventTable::standard(), 30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn lobby(n: u32) -> Vec<Team> {
        let mut teams: Vec<Team> = (1..=n)
            .map(|i| Team::new(TeamId::new(i), format!("T{i}"), 50.0))
            .collect();
        teams[0] = Team::new(TeamId::PLAYER, "Player", 50.0).as_player();
        teams
    }

    mod effect_tests {
        use super::*;

        #[test]
        fn effects_touch_the_right_counter() {
            let mut team = Team::new(TeamId::new(1), "A", 50.0);
            EventEffect::Treasure.apply(&mut team, 30.0);
            EventEffect::Flag.apply(&mut team, 30.0);
            EventEffect::Buff {
                channel: BuffChannel::Mental,
                delta: -4.0,
            }
            .apply(&mut team, 30.0);
            assert_eq!(team.treasure, 1);
            assert_eq!(team.flag, 1);
            assert!((team.buffs.mental_pct + 4.0).abs() < f64::EPSILON);
        }

        #[test]
        fn standard_deltas_stay_in_range() {
            for event in EventTable::standard().iter() {
                if let EventEffect::Buff { delta, .. } = event.effect {
                    assert!((1.0..=5.0).contains(&delta.abs()), "{} delta {delta}", event.id);
                }
                assert!(event.weight > 0);
            }
        }

        #[test]
        fn table_json_roundtrip() {
            let table = EventTable::standard();
            let json = serde_json::to_string(&table).unwrap();
            assert!(json.contains(r#""kind":"treasure""#));
            let back: EventTable = serde_json::from_str(&json).unwrap();
            assert_eq!(back, table);
        }
    }

    mod roll_tests {
        use super::*;

        #[test]
        fn events_do_not_repeat_within_round() {
            let engine = EventEngine::new(EventTable::standard(), 30.0);
            for seed in 0..100 {
                let mut teams = lobby(20);
                let mut rng = SimRng::seeded(seed);
                let outcomes = engine.roll_round_events(&mut teams, Round::TWO, 2, &mut rng);
                assert_eq!(outcomes.len(), 2);
                let ids: BTreeSet<&str> = outcomes.iter().map(|o| o.event_id.as_str()).collect();
                assert_eq!(ids.len(), 2);
            }
        }

        #[test]
        fn only_alive_teams_are_targeted() {
            let engine = EventEngine::new(EventTable::standard(), 30.0);
            let mut teams = lobby(6);
            for team in teams.iter_mut().skip(1).take(4) {
                team.eliminate(Round::ONE);
            }
            let alive: BTreeSet<TeamId> = [teams[0].id, teams[5].id].into_iter().collect();
            let mut rng = SimRng::seeded(4);
            for _ in 0..50 {
                for outcome in engine.roll_round_events(&mut teams, Round::THREE, 2, &mut rng) {
                    assert!(alive.contains(&outcome.team_id));
                }
            }
        }

        #[test]
        fn stops_when_too_few_teams() {
            let engine = EventEngine::new(EventTable::standard(), 30.0);
            let mut teams = lobby(3);
            teams[1].eliminate(Round::ONE);
            teams[2].eliminate(Round::ONE);
            let mut rng = SimRng::seeded(1);
            let outcomes = engine.roll_round_events(&mut teams, Round::FIVE, 2, &mut rng);
            assert_eq!(outcomes.len(), 1);

            teams[0].eliminate(Round::FIVE);
            assert!(engine
                .roll_round_events(&mut teams, Round::FIVE, 2, &mut rng)
                .is_empty());
        }

        #[test]
        fn narrative_only_for_player() {
            let engine = EventEngine::new(EventTable::standard(), 30.0);
            let mut rng = SimRng::seeded(2);
            let mut seen_player = false;
            for _ in 0..200 {
                let mut teams = lobby(4);
                for outcome in engine.roll_round_events(&mut teams, Round::ONE, 1, &mut rng) {
                    if outcome.team_id == TeamId::PLAYER {
                        seen_player = true;
                        let narrative = outcome.narrative.unwrap();
                        assert_eq!(narrative.header, "Round 1 event");
                    } else {
                        assert!(outcome.narrative.is_none());
                    }
                }
            }
            assert!(seen_player);
        }

        #[test]
        fn zero_planned_rolls_nothing() {
            let engine = EventEngine::new(EventTable::standard(), 30.0);
            let mut teams = lobby(20);
            let before = teams.clone();
            let mut rng = SimRng::seeded(5);
            assert!(engine
                .roll_round_events(&mut teams, Round::SIX, 0, &mut rng)
                .is_empty());
            assert_eq!(teams, before);
        }

        #[test]
        fn pool_exhaustion_degrades() {
            let table = EventTable::new(vec![EventDefinition::new(
                "only",
                "Only",
                "",
                1,
                EventEffect::Treasure,
            )]);
            let engine = EventEngine::new(table, 30.0);
            let mut teams = lobby(10);
            let mut rng = SimRng::seeded(5);
            let outcomes = engine.roll_round_events(&mut teams, Round::TWO, 2, &mut rng);
            assert_eq!(outcomes.len(), 1);
        }
    }
}
