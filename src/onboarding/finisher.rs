//! Turns a finished onboarding quiz into a profile for the paywall.

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_DREAMER_NAME;
use crate::error::FlowError;
use crate::flow::{AnswerSet, Completion, FlowFinisher, FlowOutcome, PERMISSION_GRANTED};
use crate::store::StoredValue;

use super::model::{OnboardingProfile, keys, settings_keys};

#[derive(Debug, Clone)]
pub struct OnboardingFinisher {
    default_name: String,
}

impl OnboardingFinisher {
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            default_name: default_name.into(),
        }
    }
}

impl Default for OnboardingFinisher {
    fn default() -> Self {
        Self::new(DEFAULT_DREAMER_NAME)
    }
}

impl FlowFinisher for OnboardingFinisher {
    fn finish(&self, answers: &AnswerSet, _now: DateTime<Utc>) -> Result<Completion, FlowError> {
        let name = answers
            .text(keys::NAME)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.default_name)
            .to_string();
        let choice = |id: &str| answers.choice(id).unwrap_or_default().to_string();

        let profile = OnboardingProfile {
            name: name.clone(),
            dream_recall: choice(keys::DREAM_RECALL),
            dream_goal: choice(keys::DREAM_GOAL),
            sleep_concern: choice(keys::SLEEP_CONCERN),
            notifications_granted: answers.choice(keys::NOTIFICATIONS) == Some(PERMISSION_GRANTED),
            completed: true,
        };

        Ok(Completion::new(FlowOutcome::OpenPaywall(profile))
            .with_record(settings_keys::NAME, StoredValue::Text(name))
            .with_record(settings_keys::COMPLETED, StoredValue::Flag(true)))
    }
}
