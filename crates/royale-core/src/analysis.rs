//! Monte Carlo placement analysis.
//!
//! Runs many independently seeded matches of one fixed lobby and aggregates
//! per-team placements. Matches run in parallel across seeds with rayon; each
//! match is itself single-threaded, and results are folded in seed order so
//! the report is identical regardless of thread count.

use std::collections::BTreeMap;

use dropzone::RunningStats;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::match_engine::MatchEngine;
use crate::scoring::PointCurve;
use crate::team::{Team, TeamId};

/// Placement summary of one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSummary {
    /// Team.
    pub team_id: TeamId,
    /// Team name.
    pub team_name: String,
    /// Placement statistics (1 = winner).
    pub placement: RunningStats,
    /// Total points statistics.
    pub points: RunningStats,
    /// Matches won.
    pub wins: u64,
}

impl PlacementSummary {
    /// Share of matches won.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self) -> f64 {
        if self.placement.count == 0 {
            0.0
        } else {
            self.wins as f64 / self.placement.count as f64
        }
    }
}

/// Result of [`simulate_placements`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementReport {
    /// Matches simulated.
    pub runs: u64,
    /// First seed; run `i` used `base_seed + i` (wrapping).
    pub base_seed: u64,
    /// One summary per team, in team id order.
    pub teams: Vec<PlacementSummary>,
}

impl PlacementReport {
    /// Summary of one team.
    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&PlacementSummary> {
        self.teams.iter().find(|t| t.team_id == id)
    }
}

/// Simulates `runs` matches of `teams` and aggregates placements.
///
/// Run `i` is seeded with `base_seed.wrapping_add(i)`.
///
/// # Example
///
/// ```
/// use royale_core::analysis::simulate_placements;
/// use royale_core::config::MatchConfig;
/// use royale_core::scoring::PointCurve;
/// use royale_core::team::{Team, TeamId};
///
/// let teams: Vec<Team> =
///     (1..=20).map(|i| Team::new(TeamId::new(i), format!("T{i}"), 50.0)).collect();
/// let report = simulate_placements(&teams, &MatchConfig::default(), PointCurve::Standard, 8, 1);
/// assert_eq!(report.teams.len(), 20);
/// assert_eq!(report.teams.iter().map(|t| t.wins).sum::<u64>(), 8);
/// ```
#[must_use]
pub fn simulate_placements(
    teams: &[Team],
    config: &MatchConfig,
    curve: PointCurve,
    runs: u64,
    base_seed: u64,
) -> PlacementReport {
    let count = usize::try_from(runs).unwrap_or(usize::MAX);
    let outcomes: Vec<Vec<(TeamId, usize, u32)>> = (0..count)
        .into_par_iter()
        .map(|i| {
            let seed = base_seed.wrapping_add(i as u64);
            let outcome = MatchEngine::new(teams.to_vec(), seed)
                .with_config(config.clone())
                .with_curve(curve)
                .run();
            outcome
                .rows
                .iter()
                .map(|row| (row.team_id, row.place, row.total))
                .collect()
        })
        .collect();

    let mut summaries: BTreeMap<TeamId, PlacementSummary> = BTreeMap::new();
    for rows in &outcomes {
        for &(team_id, place, total) in rows {
            let summary = summaries.entry(team_id).or_insert_with(|| PlacementSummary {
                team_id,
                team_name: teams
                    .iter()
                    .find(|t| t.id == team_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
                placement: RunningStats::empty(),
                points: RunningStats::empty(),
                wins: 0,
            });
            #[allow(clippy::cast_precision_loss)]
            summary.placement.push(place as f64);
            summary.points.push(f64::from(total));
            if place == 1 {
                summary.wins += 1;
            }
        }
    }

    PlacementReport {
        runs,
        base_seed,
        teams: summaries.into_values().collect(),
    }
}
