//! Scoring: pure mapping from quiz answers and a date-derived seed to a
//! bounded score and its narrative.

pub mod engine;
pub mod narratives;

pub use engine::{Adjustment, ScoreResult, ScoringEngine, days_between, keys};
pub use narratives::{Narrative, NarrativeTable};
