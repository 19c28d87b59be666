//! # Dropzone
//!
//! Map and randomness substrate for the royale season simulator.
//!
//! Dropzone knows nothing about teams or scoring. It provides the pieces the
//! match engine layers on top of:
//!
//! - **Rounds**: the six-round match clock ([`Round`])
//! - **Randomness**: seeded helpers for uniform picks, weighted sampling
//!   without replacement and Fisher-Yates shuffles ([`SimRng`])
//! - **Areas**: the fixed 25-area map, per-round candidate pools, initial drop
//!   placement and relocation ([`AreaMap`])
//! - **Statistics**: running mean/variance aggregates ([`RunningStats`])
//!
//! ## Quick Start
//!
//! ```
//! use dropzone::{AreaMap, Round, SimRng};
//!
//! let map = AreaMap::standard();
//! let mut rng = SimRng::seeded(42);
//!
//! // Drop 20 teams onto the round-1 pool
//! let teams: Vec<u32> = (0..20).collect();
//! let drop = map.initial_drop(&mut rng, &teams);
//! assert_eq!(drop.len(), 20);
//!
//! // Move a survivor into the round-3 pool
//! let area = map.relocate(&mut rng, Round::THREE);
//! assert!(map.candidate_areas(Round::THREE).contains(&area));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod area;
pub mod rng;
pub mod round;
pub mod stats;

// Re-exports for convenience
pub use area::{Area, AreaError, AreaId, AreaMap, DropPlacement};
pub use rng::SimRng;
pub use round::Round;
pub use stats::RunningStats;
