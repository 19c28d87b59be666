//! Stage rosters and lobby schedules.
//!
//! A roster is built from the ids carried in [`TournamentState`] and topped
//! up from the stage's catalog pool. Ids the catalog does not know are
//! skipped with a warning; the stage only fails when the field cannot be
//! filled.
//!
//! The 40-team stages (National, World Qualifiers) are dealt into four
//! groups of ten and played as two parallel 20-team lobbies per pass:
//!
//! | pass | lobbies |
//! |------|---------|
//! | 1 | A+B, C+D |
//! | 2 | A+C, B+D |
//! | 3 | A+D, B+C |

use std::collections::BTreeSet;

use dropzone::SimRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::state::{StagePhase, TournamentState};
use crate::catalog::{Catalog, TeamDefinition};
use crate::error::StageError;
use crate::team::TeamId;

/// Group labels of the grouped stages.
pub const GROUP_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Group pairings per pass.
const PASSES: [[(usize, usize); 2]; 3] = [[(0, 1), (2, 3)], [(0, 2), (1, 3)], [(0, 3), (1, 2)]];

/// One match's lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lobby {
    /// Group label such as `"A+B"`; `None` when the whole roster plays.
    pub label: Option<String>,
    /// Teams in the lobby, in roster order.
    pub team_ids: Vec<TeamId>,
}

/// Whether `phase` is played in groups.
#[must_use]
pub const fn is_grouped(phase: StagePhase) -> bool {
    matches!(phase, StagePhase::National | StagePhase::WorldQual)
}

/// Catalog pool used to fill `phase`.
fn pool(phase: StagePhase, catalog: &Catalog) -> &[TeamDefinition] {
    match phase {
        StagePhase::Local => &catalog.local,
        StagePhase::National | StagePhase::LastChance => &catalog.national,
        StagePhase::WorldQual | StagePhase::WorldLosers | StagePhase::WorldFinal => {
            &catalog.world
        }
        StagePhase::Championship => &[],
    }
}

/// Builds the roster of `phase`.
///
/// The player opens the Local roster; later stages start from the ids
/// carried in `state`. The roster is then topped up from the stage's
/// catalog pool, in catalog order, to `field_size` teams.
///
/// # Errors
///
/// Returns [`StageError::RosterTooSmall`] when fewer than `field_size`
/// known teams are available.
pub fn build_roster(
    phase: StagePhase,
    state: &TournamentState,
    catalog: &Catalog,
    field_size: usize,
) -> Result<Vec<TeamId>, StageError> {
    let carried: Vec<TeamId> = if phase == StagePhase::Local {
        vec![TeamId::PLAYER]
    } else {
        state.carried_ids(phase).to_vec()
    };

    let mut seen = BTreeSet::new();
    let mut roster = Vec::with_capacity(field_size);
    for id in carried {
        if id != TeamId::PLAYER && catalog.team(id).is_err() {
            warn!(%phase, team = %id, "carried team not in catalog, skipping");
            continue;
        }
        if seen.insert(id) {
            roster.push(id);
        }
    }
    for definition in pool(phase, catalog) {
        if roster.len() >= field_size {
            break;
        }
        if seen.insert(definition.id) {
            roster.push(definition.id);
        }
    }
    roster.truncate(field_size);

    if roster.len() < field_size {
        return Err(StageError::RosterTooSmall {
            phase,
            needed: field_size,
            available: roster.len(),
        });
    }
    Ok(roster)
}

/// Plans the lobbies of a stage.
///
/// Grouped stages shuffle the roster, deal it round-robin into groups A–D
/// and cycle through the three passes; each pass yields two lobbies, so
/// `matches` counts lobbies. Other stages play the whole roster `matches`
/// times.
pub fn plan_lobbies(
    phase: StagePhase,
    roster: &[TeamId],
    matches: usize,
    rng: &mut SimRng,
) -> Vec<Lobby> {
    if !is_grouped(phase) {
        return (0..matches)
            .map(|_| Lobby {
                label: None,
                team_ids: roster.to_vec(),
            })
            .collect();
    }

    let mut dealt = roster.to_vec();
    rng.shuffle(&mut dealt);
    let mut groups: [Vec<TeamId>; 4] = Default::default();
    for (i, id) in dealt.into_iter().enumerate() {
        groups[i % GROUP_LABELS.len()].push(id);
    }

    (0..matches)
        .map(|m| {
            let (a, b) = PASSES[(m / 2) % PASSES.len()][m % 2];
            let mut team_ids = groups[a].clone();
            team_ids.extend(groups[b].iter().copied());
            Lobby {
                label: Some(format!("{}+{}", GROUP_LABELS[a], GROUP_LABELS[b])),
                team_ids,
            }
        })
        .collect()
}
