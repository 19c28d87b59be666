//! Combat power model.
//!
//! Converts a team's base power, event buffs and coach skill into the single
//! scalar the battle resolver compares:
//!
//! ```text
//! power = base
//!       * (1 + aim/100)
//!       * (1 + mental/100)
//!       * (1 + agility/100)
//!       * coach(round)
//! clamped to [1, 100]
//! ```
//!
//! Malformed inputs never fail: a non-finite base power reads as
//! [`NEUTRAL_BASE_POWER`], a non-finite buff as 0 %, and a non-finite or
//! non-positive coach multiplier as 1.0.

use dropzone::Round;

use crate::team::{CoachSkill, EventBuffs, Team};

/// Base power substituted for a non-finite value.
pub const NEUTRAL_BASE_POWER: f64 = 50.0;

/// Lower bound of combat power.
pub const MIN_POWER: f64 = 1.0;

/// Upper bound of combat power.
pub const MAX_POWER: f64 = 100.0;

/// Combat power of `team` in `round`.
///
/// # Example
///
/// ```
/// use dropzone::Round;
/// use royale_core::power::power;
/// use royale_core::team::{BuffChannel, Team, TeamId};
///
/// let mut team = Team::new(TeamId::new(1), "Gulls", 50.0);
/// team.buffs.apply(BuffChannel::Aim, 10.0, 30.0);
/// assert!((power(&team, Round::ONE) - 55.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn power(team: &Team, round: Round) -> f64 {
    combine(
        team.base_power,
        &team.buffs,
        coach_multiplier(team.coach.as_ref(), round),
    )
}

/// Applies the buff and coach modifiers, in fixed order, to a base power.
#[must_use]
pub fn combine(base_power: f64, buffs: &EventBuffs, coach: f64) -> f64 {
    let base = if base_power.is_finite() {
        base_power
    } else {
        NEUTRAL_BASE_POWER
    };
    let coach = if coach.is_finite() && coach > 0.0 {
        coach
    } else {
        1.0
    };
    let raw = base
        * buff_factor(buffs.aim_pct)
        * buff_factor(buffs.mental_pct)
        * buff_factor(buffs.agility_pct)
        * coach;
    if raw.is_nan() {
        // inf * 0 from extreme buff values
        return NEUTRAL_BASE_POWER;
    }
    raw.clamp(MIN_POWER, MAX_POWER)
}

/// Coach multiplier for `round`: the skill's multiplier from its
/// `min_round` onward, 1.0 before that or without a skill.
#[must_use]
pub fn coach_multiplier(coach: Option<&CoachSkill>, round: Round) -> f64 {
    match coach {
        Some(skill) if round >= skill.min_round => {
            if skill.multiplier.is_finite() && skill.multiplier > 0.0 {
                skill.multiplier
            } else {
                1.0
            }
        }
        _ => 1.0,
    }
}

fn buff_factor(pct: f64) -> f64 {
    if pct.is_finite() {
        1.0 + pct / 100.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::{BuffChannel, TeamId};
    use proptest::prelude::*;

    fn endgame_coach(multiplier: f64) -> CoachSkill {
        CoachSkill {
            id: "closer".to_string(),
            name: "Closer".to_string(),
            multiplier,
            min_round: Round::FIVE,
        }
    }

    mod model_tests {
        use super::*;

        #[test]
        fn unbuffed_power_is_base() {
            let team = Team::new(TeamId::new(1), "A", 42.0);
            assert!((power(&team, Round::THREE) - 42.0).abs() < 1e-9);
        }

        #[test]
        fn modifiers_multiply() {
            let buffs = EventBuffs {
                aim_pct: 10.0,
                mental_pct: -10.0,
                agility_pct: 0.0,
            };
            let expected = 50.0 * 1.1 * 0.9 * 1.2;
            assert!((combine(50.0, &buffs, 1.2) - expected).abs() < 1e-9);
        }

        #[test]
        fn result_is_clamped() {
            let buffs = EventBuffs {
                aim_pct: 30.0,
                mental_pct: 30.0,
                agility_pct: 30.0,
            };
            assert!((combine(95.0, &buffs, 1.5) - MAX_POWER).abs() < f64::EPSILON);
            assert!((combine(0.0, &EventBuffs::default(), 1.0) - MIN_POWER).abs() < f64::EPSILON);
        }

        #[test]
        fn malformed_inputs_are_neutral() {
            let buffs = EventBuffs {
                aim_pct: f64::NAN,
                mental_pct: f64::INFINITY,
                agility_pct: 0.0,
            };
            assert!((combine(f64::NAN, &buffs, f64::NAN) - NEUTRAL_BASE_POWER).abs() < 1e-9);
            assert!((combine(40.0, &EventBuffs::default(), -2.0) - 40.0).abs() < 1e-9);
        }
    }

    mod coach_tests {
        use super::*;

        #[test]
        fn endgame_skill_waits_for_round_five() {
            let coach = endgame_coach(1.25);
            assert!((coach_multiplier(Some(&coach), Round::FOUR) - 1.0).abs() < f64::EPSILON);
            assert!((coach_multiplier(Some(&coach), Round::FIVE) - 1.25).abs() < f64::EPSILON);
            assert!((coach_multiplier(Some(&coach), Round::SIX) - 1.25).abs() < f64::EPSILON);
            assert!((coach_multiplier(None, Round::SIX) - 1.0).abs() < f64::EPSILON);
        }

        #[test]
        fn team_power_uses_coach_by_round() {
            let mut team =
                Team::new(TeamId::new(2), "B", 40.0).with_coach(Some(endgame_coach(1.5)));
            team.buffs.apply(BuffChannel::Agility, 5.0, 30.0);
            assert!((power(&team, Round::ONE) - 42.0).abs() < 1e-9);
            assert!((power(&team, Round::FIVE) - 63.0).abs() < 1e-9);
        }

        #[test]
        fn broken_multiplier_is_ignored() {
            let coach = endgame_coach(f64::NAN);
            assert!((coach_multiplier(Some(&coach), Round::SIX) - 1.0).abs() < f64::EPSILON);
        }
    }

    proptest! {
        #[test]
        fn power_always_in_bounds(
            base in prop::num::f64::ANY,
            aim in prop::num::f64::ANY,
            mental in -30.0f64..30.0,
            agility in -30.0f64..30.0,
            coach in prop::num::f64::ANY,
        ) {
            let buffs = EventBuffs { aim_pct: aim, mental_pct: mental, agility_pct: agility };
            let p = combine(base, &buffs, coach);
            prop_assert!((MIN_POWER..=MAX_POWER).contains(&p));
        }
    }
}
