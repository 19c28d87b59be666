//! Fixed season calendar and the next-event scheduler.
//!
//! The scheduler is a pure function of the calendar date and the
//! [`TournamentState`]: it never reads the store and never infers
//! eligibility from the date. A slot is offered only when
//! [`TournamentState::can_enter`] accepts its stage.

use serde::{Deserialize, Serialize};

use super::state::{CalendarDate, StagePhase, TournamentState};

/// One fixed calendar slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarSlot {
    /// Stage played in the slot.
    pub phase: StagePhase,
    /// Month, 1–12.
    pub month: u8,
    /// Week, 1–4.
    pub week: u8,
}

impl CalendarSlot {
    const fn new(phase: StagePhase, month: u8, week: u8) -> Self {
        Self { phase, month, week }
    }

    /// The slot's date in `year`.
    #[must_use]
    pub fn date_in(&self, year: u32) -> CalendarDate {
        CalendarDate::new(year, self.month, self.week)
    }
}

/// The season calendar, in date order.
pub static SEASON_CALENDAR: [CalendarSlot; 7] = [
    CalendarSlot::new(StagePhase::Local, 2, 1),
    CalendarSlot::new(StagePhase::National, 4, 2),
    CalendarSlot::new(StagePhase::LastChance, 6, 1),
    CalendarSlot::new(StagePhase::WorldQual, 8, 1),
    CalendarSlot::new(StagePhase::WorldLosers, 8, 3),
    CalendarSlot::new(StagePhase::WorldFinal, 9, 1),
    CalendarSlot::new(StagePhase::Championship, 12, 2),
];

/// Result of [`next_eligible_event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextEvent {
    /// The nearest slot the player may enter.
    Scheduled {
        /// Display title.
        name: String,
        /// Stage.
        phase: StagePhase,
        /// Slot date.
        date: CalendarDate,
        /// Weeks from now (0 = this week).
        weeks_until: u64,
    },
    /// No calendar slot is currently enterable.
    Undetermined,
}

impl NextEvent {
    /// The scheduled phase, if any.
    #[must_use]
    pub fn phase(&self) -> Option<StagePhase> {
        match self {
            Self::Scheduled { phase, .. } => Some(*phase),
            Self::Undetermined => None,
        }
    }
}

/// Finds the nearest slot, from `now` onwards, whose stage is enterable.
///
/// Scans the rest of the current year, then the whole of the next one.
///
/// # Example
///
/// ```
/// use royale_core::tournament::{next_eligible_event, CalendarDate, NextEvent, TournamentState};
///
/// let state = TournamentState::default();
/// let next = next_eligible_event(CalendarDate::new(1, 1, 1), &state);
/// assert!(matches!(next, NextEvent::Scheduled { weeks_until: 4, .. }));
/// ```
#[must_use]
pub fn next_eligible_event(now: CalendarDate, state: &TournamentState) -> NextEvent {
    let years = [now.year, now.year.saturating_add(1)];
    years
        .iter()
        .flat_map(|year| SEASON_CALENDAR.iter().map(move |slot| (slot, slot.date_in(*year))))
        .filter(|(slot, _)| state.can_enter(slot.phase).is_ok())
        .find_map(|(slot, date)| {
            now.weeks_until(&date).map(|weeks_until| NextEvent::Scheduled {
                name: slot.phase.title().to_string(),
                phase: slot.phase,
                date,
                weeks_until,
            })
        })
        .unwrap_or(NextEvent::Undetermined)
}

/// The enterable stage whose slot falls on `now`, if any.
#[must_use]
pub fn due_phase(now: CalendarDate, state: &TournamentState) -> Option<StagePhase> {
    SEASON_CALENDAR
        .iter()
        .find(|slot| slot.month == now.month && slot.week == now.week)
        .map(|slot| slot.phase)
        .filter(|phase| state.can_enter(*phase).is_ok())
}
