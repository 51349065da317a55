//! Onboarding: the first-launch quiz.
//!
//! A fixed sequence of pages collects a display name and a few sleep
//! questions, asks once for notification permission, and finishes by
//! handing an `OnboardingProfile` to the paywall. Completion is recorded
//! in the settings store so later launches skip straight to the app.

pub mod finisher;
pub mod model;
pub mod steps;

use std::sync::Arc;

use tracing::warn;

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::flow::{FlowController, FlowDeps, Step};
use crate::store::KeyValueStore;

pub use finisher::OnboardingFinisher;
pub use model::{OnboardingProfile, keys, settings_keys};
pub use steps::onboarding_steps;

/// Flow name used in logs and snapshots.
pub const FLOW_NAME: &str = "onboarding";

/// Whether the quiz still has to run. Read once at launch.
///
/// An unreadable store counts as "not onboarded": showing the quiz twice
/// is better than skipping it.
pub async fn needs_onboarding(store: &dyn KeyValueStore) -> bool {
    match store.get(settings_keys::COMPLETED).await {
        Ok(value) => !value.and_then(|v| v.as_flag()).unwrap_or(false),
        Err(e) => {
            warn!(error = %e, "Could not read onboarding flag; running onboarding");
            true
        }
    }
}

/// Builds onboarding flow controllers.
pub struct OnboardingWizard;

impl OnboardingWizard {
    pub fn controller(config: &FlowConfig, deps: FlowDeps) -> Result<FlowController, FlowError> {
        let sequence = Arc::new(onboarding_steps()?);
        let finisher = Arc::new(OnboardingFinisher::new(config.default_name.clone()));
        Ok(FlowController::new(FLOW_NAME, sequence, finisher, deps)
            .with_submission_delay(config.onboarding_delay)
            .with_terminal_steps(
                Step::loading("Preparing your journal"),
                Step::results("Welcome aboard"),
            ))
    }
}
