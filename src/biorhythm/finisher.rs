//! Scores a finished biorhythm wizard.

use chrono::{DateTime, Utc};

use crate::error::{FlowError, ScoringError};
use crate::flow::{AnswerSet, Completion, FlowFinisher, FlowOutcome};
use crate::scoring::{ScoringEngine, keys};
use crate::store::StoredValue;

use super::settings_keys;

#[derive(Debug, Clone, Default)]
pub struct BiorhythmFinisher {
    engine: ScoringEngine,
}

impl BiorhythmFinisher {
    pub fn new(engine: ScoringEngine) -> Self {
        Self { engine }
    }
}

impl FlowFinisher for BiorhythmFinisher {
    fn finish(&self, answers: &AnswerSet, now: DateTime<Utc>) -> Result<Completion, FlowError> {
        let birth_date =
            answers
                .date(keys::BIRTH_DATE)
                .ok_or_else(|| ScoringError::MissingBirthDate {
                    step_id: keys::BIRTH_DATE.to_string(),
                })?;

        let today = now.date_naive();
        let result = self.engine.score(birth_date, today, answers)?;
        let score = i64::from(result.score);

        Ok(Completion::new(FlowOutcome::Scored(result))
            .with_record(settings_keys::LAST_SCORE, StoredValue::Number(score))
            .with_record(settings_keys::LAST_RUN, StoredValue::Date(today)))
    }
}
