//! Tennis scoring engine
//!
//! A pure state machine over [`MatchState`] snapshots for best-of-three,
//! no-tiebreak matches. Storage, authorization and serialization of writes
//! belong to the caller (see `crate::matches`).

pub mod engine;
pub mod error;
pub mod state;

#[cfg(test)]
mod props;

pub use engine::{apply_point, classify, closed_set, replay, PointOutcome};
pub use error::ScoreError;
pub use state::{MatchState, Player, PlayerScore, Point, SetScore};
