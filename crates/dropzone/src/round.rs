//! The six-round match clock.
//!
//! Every per-round table in the simulator (area pools, encounter slots, event
//! counts, involvement probabilities) is indexed by [`Round`], so the tables
//! are total functions and an out-of-range round cannot reach them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::area::AreaError;

/// One of the six rounds of a match, `1..=6`.
///
/// # Example
///
/// ```
/// use dropzone::Round;
///
/// let round = Round::new(3).unwrap();
/// assert_eq!(round.get(), 3);
/// assert_eq!(round.next(), Some(Round::FOUR));
/// assert!(Round::new(7).is_none());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Round(u8);

impl Round {
    /// Number of rounds in a match.
    pub const COUNT: usize = 6;

    /// Round 1 (the drop round).
    pub const ONE: Self = Self(1);
    /// Round 2.
    pub const TWO: Self = Self(2);
    /// Round 3.
    pub const THREE: Self = Self(3);
    /// Round 4.
    pub const FOUR: Self = Self(4);
    /// Round 5.
    pub const FIVE: Self = Self(5);
    /// Round 6 (the final confrontation).
    pub const SIX: Self = Self(6);

    /// All rounds in order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ONE,
        Self::TWO,
        Self::THREE,
        Self::FOUR,
        Self::FIVE,
        Self::SIX,
    ];

    /// Creates a round from its number, or `None` outside `1..=6`.
    #[must_use]
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number <= 6 {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Returns the round number (`1..=6`).
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index into per-round tables.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// The following round, or `None` after round 6.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// Returns true for the final round.
    #[must_use]
    pub const fn is_final(self) -> bool {
        self.0 == 6
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl TryFrom<u8> for Round {
    type Error = AreaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(AreaError::RoundOutOfRange(value))
    }
}

impl From<Round> for u8 {
    fn from(round: Round) -> Self {
        round.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_one_through_six() {
        for n in 1..=6 {
            assert_eq!(Round::new(n).map(Round::get), Some(n));
        }
        assert!(Round::new(0).is_none());
        assert!(Round::new(7).is_none());
    }

    #[test]
    fn next_walks_all_rounds() {
        let mut walked = vec![Round::ONE];
        while let Some(next) = walked.last().and_then(|r| r.next()) {
            walked.push(next);
        }
        assert_eq!(walked, Round::ALL.to_vec());
        assert!(Round::SIX.is_final());
    }

    #[test]
    fn index_is_zero_based() {
        assert_eq!(Round::ONE.index(), 0);
        assert_eq!(Round::SIX.index(), 5);
    }

    #[test]
    fn serde_uses_plain_number() {
        let json = serde_json::to_string(&Round::FOUR).unwrap();
        assert_eq!(json, "4");
        let back: Round = serde_json::from_str("4").unwrap();
        assert_eq!(back, Round::FOUR);
        assert!(serde_json::from_str::<Round>("9").is_err());
    }
}
