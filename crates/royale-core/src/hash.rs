//! State hashing for determinism checks and replays.
//!
//! Two matches run from the same roster and seed must produce identical
//! hashes; the determinism tests and the replay tooling compare these values
//! instead of whole snapshots.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::output::MatchOutcome;
use crate::scoring::MatchRow;
use crate::team::Team;

/// Hash of every team's match-relevant state.
///
/// Includes identity, head count, elimination round, area, counters and
/// buffs (as bit patterns). Team order matters; the match engine always holds
/// teams in id order.
#[must_use]
pub fn hash_teams(teams: &[Team]) -> u64 {
    let mut hasher = DefaultHasher::new();
    teams.len().hash(&mut hasher);
    for team in teams {
        hash_team(team, &mut hasher);
    }
    hasher.finish()
}

/// Hash of a list of result rows.
#[must_use]
pub fn hash_rows(rows: &[MatchRow]) -> u64 {
    let mut hasher = DefaultHasher::new();
    rows.len().hash(&mut hasher);
    for row in rows {
        row.place.hash(&mut hasher);
        row.team_id.hash(&mut hasher);
        row.eliminated_round.hash(&mut hasher);
        row.placement_points.hash(&mut hasher);
        row.kill_points.hash(&mut hasher);
        row.assist_points.hash(&mut hasher);
        row.treasure_points.hash(&mut hasher);
        row.flag_points.hash(&mut hasher);
        row.total.hash(&mut hasher);
    }
    hasher.finish()
}

/// Hash of a complete match record: seed, rows and the per-round battles.
#[must_use]
pub fn hash_outcome(outcome: &MatchOutcome) -> u64 {
    let mut hasher = DefaultHasher::new();
    outcome.seed.hash(&mut hasher);
    hash_rows(&outcome.rows).hash(&mut hasher);
    for report in &outcome.rounds {
        report.round.hash(&mut hasher);
        report.alive_after.hash(&mut hasher);
        for encounter in &report.encounters {
            encounter.team_a.hash(&mut hasher);
            encounter.team_b.hash(&mut hasher);
            encounter.fallback.hash(&mut hasher);
        }
        for battle in &report.battles {
            battle.winner.hash(&mut hasher);
            battle.loser.hash(&mut hasher);
            battle.win_pct_a.to_bits().hash(&mut hasher);
        }
        for event in &report.events {
            event.event_id.hash(&mut hasher);
            event.team_id.hash(&mut hasher);
        }
    }
    hasher.finish()
}

fn hash_team<H: Hasher>(team: &Team, hasher: &mut H) {
    team.id.hash(hasher);
    team.is_player.hash(hasher);
    team.base_power.to_bits().hash(hasher);
    team.alive().hash(hasher);
    team.eliminated_round().hash(hasher);
    team.area.hash(hasher);
    team.kills_total.hash(hasher);
    team.assists_total.hash(hasher);
    team.treasure.hash(hasher);
    team.flag.hash(hasher);
    team.buffs.aim_pct.to_bits().hash(hasher);
    team.buffs.mental_pct.to_bits().hash(hasher);
    team.buffs.agility_pct.to_bits().hash(hasher);
    for member in &team.members {
        member.kills.hash(hasher);
        member.assists.hash(hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamId;
    use dropzone::Round;

    #[test]
    fn equal_state_equal_hash() {
        let a = vec![Team::new(TeamId::new(1), "A", 50.0)];
        let b = a.clone();
        assert_eq!(hash_teams(&a), hash_teams(&b));
    }

    #[test]
    fn elimination_changes_hash() {
        let a = vec![Team::new(TeamId::new(1), "A", 50.0)];
        let mut b = a.clone();
        b[0].eliminate(Round::ONE);
        assert_ne!(hash_teams(&a), hash_teams(&b));
    }

    #[test]
    fn buff_changes_hash() {
        let a = vec![Team::new(TeamId::new(1), "A", 50.0)];
        let mut b = a.clone();
        b[0].buffs.aim_pct = 1.0;
        assert_ne!(hash_teams(&a), hash_teams(&b));
    }
}
