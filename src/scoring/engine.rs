//! Deterministic biorhythm scoring.
//!
//! The score is seeded by the number of whole days since the birth date,
//! nudged by a fixed, ordered list of quiz adjustments, and mapped to a
//! narrative. Adjustment order matters: every delta clamps into range
//! before the next one applies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, ScoringError};
use crate::flow::AnswerSet;

use super::narratives::NarrativeTable;

/// Step ids and option values the biorhythm adjustments key on.
pub mod keys {
    pub const BIRTH_DATE: &str = "birth_date";
    pub const DREAM_FREQUENCY: &str = "dream_frequency";
    pub const NIGHTMARE_FREQUENCY: &str = "nightmare_frequency";
    pub const SLEEP_DURATION: &str = "sleep_duration";

    pub const DREAMS_NEVER: &str = "never";
    pub const DREAMS_RARELY: &str = "rarely";
    pub const DREAMS_SOMETIMES: &str = "sometimes";
    pub const DREAMS_OFTEN: &str = "often";
    pub const DREAMS_EACH_NIGHT: &str = "each_night";

    pub const NIGHTMARES_NONE: &str = "none";
    pub const NIGHTMARES_FEW: &str = "few";
    pub const NIGHTMARES_HALF: &str = "half";
    pub const NIGHTMARES_MOST: &str = "most";
    pub const NIGHTMARES_EACH_ONE: &str = "each_one";

    pub const SLEEP_UNDER_5: &str = "under_5";
    pub const SLEEP_5_TO_7: &str = "5_to_7";
    pub const SLEEP_7_TO_9: &str = "7_to_9";
    pub const SLEEP_OVER_9: &str = "over_9";
}

/// Output of a scoring run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: i32,
    pub narrative_meaning: String,
    pub daily_impact: String,
    pub recommendations: String,
}

/// One rule: if `step_id` was answered with `value`, add `delta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub step_id: String,
    pub value: String,
    pub delta: i32,
}

impl Adjustment {
    pub fn new(step_id: &str, value: &str, delta: i32) -> Self {
        Self {
            step_id: step_id.to_string(),
            value: value.to_string(),
            delta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    min_score: i32,
    max_score: i32,
    adjustments: Vec<Adjustment>,
    narratives: NarrativeTable,
}

impl ScoringEngine {
    pub fn new(
        min_score: i32,
        max_score: i32,
        adjustments: Vec<Adjustment>,
        narratives: NarrativeTable,
    ) -> Result<Self, FlowError> {
        if min_score > max_score {
            return Err(FlowError::Definition(format!(
                "score range {min_score}..={max_score} is empty"
            )));
        }
        Ok(Self {
            min_score,
            max_score,
            adjustments,
            narratives,
        })
    }

    /// The biorhythm engine: range 1..=9 and the dream, nightmare and sleep
    /// adjustments in that order.
    pub fn biorhythm() -> Self {
        use keys::*;
        Self {
            min_score: 1,
            max_score: 9,
            adjustments: vec![
                Adjustment::new(DREAM_FREQUENCY, DREAMS_NEVER, -2),
                Adjustment::new(DREAM_FREQUENCY, DREAMS_EACH_NIGHT, 2),
                Adjustment::new(NIGHTMARE_FREQUENCY, NIGHTMARES_EACH_ONE, -1),
                Adjustment::new(NIGHTMARE_FREQUENCY, NIGHTMARES_NONE, 1),
                Adjustment::new(SLEEP_DURATION, SLEEP_UNDER_5, -1),
                Adjustment::new(SLEEP_DURATION, SLEEP_OVER_9, 1),
            ],
            narratives: NarrativeTable::biorhythm(),
        }
    }

    /// Score the answers against a birth date as of `now`.
    pub fn score(
        &self,
        birth_date: NaiveDate,
        now: NaiveDate,
        answers: &AnswerSet,
    ) -> Result<ScoreResult, ScoringError> {
        let days = days_between(birth_date, now);
        let mut score = self.base_score(days);

        for adjustment in &self.adjustments {
            if answers.choice(&adjustment.step_id) == Some(adjustment.value.as_str()) {
                score = self.clamp(score.saturating_add(adjustment.delta));
            }
        }
        let score = self.clamp(score);

        let narrative = self
            .narratives
            .get(score)
            .ok_or(ScoringError::InternalInvariant { score })?;

        Ok(ScoreResult {
            score,
            narrative_meaning: narrative.meaning.clone(),
            daily_impact: narrative.daily_impact.clone(),
            recommendations: narrative.recommendations.clone(),
        })
    }

    /// Unadjusted score for a day count: cycles through the range.
    pub fn base_score(&self, days: i64) -> i32 {
        let min = i64::from(self.min_score);
        let span = i64::from(self.max_score) - min + 1;
        // min + offset never exceeds max, so it fits back in i32
        (min + days.max(0) % span) as i32
    }

    fn clamp(&self, score: i32) -> i32 {
        score.clamp(self.min_score, self.max_score)
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::biorhythm()
    }
}

/// Whole days from `birth_date` to `now`; zero for a future birth date.
pub fn days_between(birth_date: NaiveDate, now: NaiveDate) -> i64 {
    now.signed_duration_since(birth_date).num_days().max(0)
}
