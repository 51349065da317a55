//! Flow lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

use super::answer::AnswerSet;
use super::finisher::FlowOutcome;

/// Coarse lifecycle phase of a flow instance.
///
/// Progresses forward only: InProgress → Submitting → Completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    #[default]
    InProgress,
    Submitting,
    Completed,
}

impl FlowPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: FlowPhase) -> bool {
        use FlowPhase::*;
        matches!((self, target), (InProgress, Submitting) | (Submitting, Completed))
    }

    /// Whether user intents (advance, retreat, answers) are accepted.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "in_progress",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Mutable state of one flow instance. Owned by exactly one controller.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    pub current_step: usize,
    pub answers: AnswerSet,
    pub phase: FlowPhase,
    pub outcome: Option<FlowOutcome>,
    /// Set once the permission interjection has run for this instance.
    pub permission_requested: bool,
}

impl FlowState {
    /// Move to `target`, rejecting anything but the next forward phase.
    pub fn transition_to(&mut self, target: FlowPhase) -> Result<(), FlowError> {
        if !self.phase.can_transition_to(target) {
            return Err(FlowError::InvalidState {
                intent: format!("enter {target}"),
                phase: self.phase.to_string(),
            });
        }
        self.phase = target;
        Ok(())
    }

    /// Reject an intent unless the flow is still in progress.
    pub fn ensure_accepts(&self, intent: &str) -> Result<(), FlowError> {
        if self.phase.accepts_input() {
            Ok(())
        } else {
            Err(FlowError::InvalidState {
                intent: intent.to_string(),
                phase: self.phase.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use FlowPhase::*;
        assert!(InProgress.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Completed));
    }

    #[test]
    fn invalid_transitions() {
        use FlowPhase::*;
        // Skip
        assert!(!InProgress.can_transition_to(Completed));
        // Backward
        assert!(!Submitting.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Submitting));
        // Self
        assert!(!Submitting.can_transition_to(Submitting));
    }

    #[test]
    fn only_in_progress_accepts_input() {
        assert!(FlowPhase::InProgress.accepts_input());
        assert!(!FlowPhase::Submitting.accepts_input());
        assert!(!FlowPhase::Completed.accepts_input());
    }

    #[test]
    fn display_matches_serde() {
        for phase in [FlowPhase::InProgress, FlowPhase::Submitting, FlowPhase::Completed] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
    }

    #[test]
    fn state_walks_forward_once() {
        let mut state = FlowState::default();
        assert_eq!(state.phase, FlowPhase::InProgress);
        state.transition_to(FlowPhase::Submitting).unwrap();
        assert!(state.transition_to(FlowPhase::Submitting).is_err());
        state.transition_to(FlowPhase::Completed).unwrap();
        assert!(state.transition_to(FlowPhase::Completed).is_err());
    }

    #[test]
    fn ensure_accepts_reports_phase() {
        let mut state = FlowState::default();
        assert!(state.ensure_accepts("advance").is_ok());
        state.phase = FlowPhase::Completed;
        let err = state.ensure_accepts("retreat").unwrap_err();
        assert_eq!(err.to_string(), "Cannot retreat while flow is completed");
    }
}
