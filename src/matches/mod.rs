//! Matches: records, response shapes and the scoring service

pub mod model;
pub mod service;

pub use model::{MatchRecord, MatchResponse, ScoreResponse, ServerChoice, SetRecord};
pub use service::{MatchError, MatchService};
