//! Biorhythm analysis wizard: birth date plus a short sleep quiz, scored
//! into one of nine narrative readings after a short "analyzing" pause.

pub mod finisher;
pub mod steps;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::flow::{Answer, FlowController, FlowDeps, Step};
use crate::scoring::{ScoringEngine, keys};
use crate::store::KeyValueStore;

pub use finisher::BiorhythmFinisher;
pub use steps::biorhythm_steps;

/// Settings keys the biorhythm wizard writes.
pub mod settings_keys {
    /// Long-lived profile field, written as soon as it is entered.
    pub const BIRTH_DATE: &str = "profile.birth_date";
    pub const DREAM_FREQUENCY: &str = "biorhythm.dream_frequency";
    pub const NIGHTMARE_FREQUENCY: &str = "biorhythm.nightmare_frequency";
    pub const SLEEP_DURATION: &str = "biorhythm.sleep_duration";
    pub const LAST_SCORE: &str = "biorhythm.last_score";
    pub const LAST_RUN: &str = "biorhythm.last_run";
}

/// Flow name used in logs and snapshots.
pub const FLOW_NAME: &str = "biorhythm";

/// Builds biorhythm flow controllers.
pub struct BiorhythmWizard;

impl BiorhythmWizard {
    /// A fresh wizard using the default scoring engine.
    pub fn controller(config: &FlowConfig, deps: FlowDeps) -> Result<FlowController, FlowError> {
        Self::with_engine(config, deps, ScoringEngine::biorhythm())
    }

    pub fn with_engine(
        config: &FlowConfig,
        deps: FlowDeps,
        engine: ScoringEngine,
    ) -> Result<FlowController, FlowError> {
        let sequence = Arc::new(biorhythm_steps()?);
        let finisher = Arc::new(BiorhythmFinisher::new(engine));
        Ok(FlowController::new(FLOW_NAME, sequence, finisher, deps)
            .with_submission_delay(config.submission_delay)
            .with_terminal_steps(
                Step::loading("Analyzing your biorhythm")
                    .with_body("Reading your cycle and matching it to your sleep patterns."),
                Step::results("Your biorhythm"),
            ))
    }

    /// Fill the birth date from a previous run, if one was saved. Call at
    /// flow start only. Returns whether a date was applied.
    pub async fn prefill_from(
        controller: &FlowController,
        store: &dyn KeyValueStore,
    ) -> Result<bool, FlowError> {
        let stored = match store.get(settings_keys::BIRTH_DATE).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Could not read stored birth date");
                return Ok(false);
            }
        };

        match stored.as_ref().and_then(|v| v.as_date()) {
            Some(date) => {
                controller
                    .set_answer(keys::BIRTH_DATE, Answer::Date(date))
                    .await?;
                debug!(%date, "Birth date prefilled");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoredValue};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn prefill_uses_stored_birth_date() {
        let store = Arc::new(MemoryStore::new());
        let birth = NaiveDate::from_ymd_opt(1990, 3, 14).unwrap();
        store
            .set(settings_keys::BIRTH_DATE, StoredValue::Date(birth))
            .await
            .unwrap();

        let ctrl =
            BiorhythmWizard::controller(&FlowConfig::default(), FlowDeps::new(store.clone()))
                .unwrap();
        assert!(BiorhythmWizard::prefill_from(&ctrl, store.as_ref()).await.unwrap());
        assert_eq!(ctrl.answers().await.date(keys::BIRTH_DATE), Some(birth));
    }

    #[tokio::test]
    async fn prefill_without_stored_date_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let ctrl =
            BiorhythmWizard::controller(&FlowConfig::default(), FlowDeps::new(store.clone()))
                .unwrap();
        assert!(!BiorhythmWizard::prefill_from(&ctrl, store.as_ref()).await.unwrap());
        assert!(ctrl.answers().await.is_empty());
    }

    #[tokio::test]
    async fn birth_date_is_persisted_on_entry() {
        let store = Arc::new(MemoryStore::new());
        let ctrl =
            BiorhythmWizard::controller(&FlowConfig::default(), FlowDeps::new(store.clone()))
                .unwrap();
        let birth = NaiveDate::from_ymd_opt(2001, 12, 1).unwrap();

        ctrl.set_answer(keys::BIRTH_DATE, Answer::Date(birth))
            .await
            .unwrap();

        ctrl.flush().await;
        assert_eq!(
            store.get(settings_keys::BIRTH_DATE).await.unwrap(),
            Some(StoredValue::Date(birth))
        );
        // Quiz answers wait for completion
        ctrl.set_answer(keys::DREAM_FREQUENCY, Answer::choice(keys::DREAMS_OFTEN))
            .await
            .unwrap();
        ctrl.flush().await;
        assert!(store.get(settings_keys::DREAM_FREQUENCY).await.unwrap().is_none());
    }
}
