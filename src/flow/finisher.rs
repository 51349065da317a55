//! Terminal computation run when a flow finishes submitting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::onboarding::OnboardingProfile;
use crate::scoring::ScoreResult;
use crate::store::StoredValue;

use super::answer::AnswerSet;

/// What a completed flow produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// Biorhythm analysis result.
    Scored(ScoreResult),
    /// Onboarding is done; the presentation layer should open the paywall.
    OpenPaywall(OnboardingProfile),
}

impl FlowOutcome {
    pub fn score(&self) -> Option<&ScoreResult> {
        match self {
            Self::Scored(result) => Some(result),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&OnboardingProfile> {
        match self {
            Self::OpenPaywall(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Outcome plus any extra records to persist alongside the answers.
#[derive(Debug, Clone)]
pub struct Completion {
    pub outcome: FlowOutcome,
    pub records: Vec<(String, StoredValue)>,
}

impl Completion {
    pub fn new(outcome: FlowOutcome) -> Self {
        Self {
            outcome,
            records: Vec::new(),
        }
    }

    pub fn with_record(mut self, key: impl Into<String>, value: StoredValue) -> Self {
        self.records.push((key.into(), value));
        self
    }
}

/// Per-flow completion logic. Must be deterministic for a given answer set
/// and `now`.
pub trait FlowFinisher: Send + Sync {
    fn finish(&self, answers: &AnswerSet, now: DateTime<Utc>) -> Result<Completion, FlowError>;
}
