//! The seven-page onboarding quiz.

use crate::error::FlowError;
use crate::flow::{Step, StepOption, StepSequence};

use super::model::{keys, settings_keys};

pub fn onboarding_steps() -> Result<StepSequence, FlowError> {
    StepSequence::new(vec![
        Step::info(keys::WELCOME, "Welcome to your dream journal")
            .with_body("A few quick questions so we can tailor your nights."),
        Step::text_input(keys::NAME, "What should we call you?")
            .with_body("Leave it empty and we'll pick a name for you."),
        Step::single_choice(
            keys::DREAM_RECALL,
            "How often do you remember your dreams?",
            vec![
                StepOption::new("Almost never", "rarely"),
                StepOption::new("A few times a week", "sometimes"),
                StepOption::new("Most mornings", "often"),
            ],
        )
        .stored_as(settings_keys::DREAM_RECALL),
        Step::single_choice(
            keys::DREAM_GOAL,
            "What would you like from your dreams?",
            vec![
                StepOption::new("Remember more of them", "recall"),
                StepOption::new("Understand what they mean", "meaning"),
                StepOption::new("Learn lucid dreaming", "lucid"),
                StepOption::new("Fewer nightmares", "calm"),
            ],
        )
        .stored_as(settings_keys::DREAM_GOAL),
        Step::single_choice(
            keys::SLEEP_CONCERN,
            "What bothers your sleep the most?",
            vec![
                StepOption::new("Falling asleep", "falling_asleep"),
                StepOption::new("Waking up at night", "waking_up"),
                StepOption::new("Nightmares", "nightmares"),
                StepOption::new("Nothing in particular", "none"),
            ],
        )
        .stored_as(settings_keys::SLEEP_CONCERN),
        Step::info(keys::NOTIFICATIONS, "Morning reminders")
            .with_body("A gentle nudge to write your dream down before it fades.")
            .stored_as(settings_keys::NOTIFICATIONS_GRANTED)
            .requests_permission(),
        Step::info(keys::READY, "You're all set")
            .with_body("Let's unlock your full dream journal."),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::StepKind;

    #[test]
    fn quiz_layout() {
        let seq = onboarding_steps().unwrap();
        assert_eq!(seq.step_count(), 7);
        assert_eq!(seq.steps()[0].id, keys::WELCOME);
        assert_eq!(seq.steps()[6].id, keys::READY);

        let name = seq.get(keys::NAME).unwrap();
        assert_eq!(name.kind, StepKind::TextInput);
        assert!(!name.required);
        // Written by the finisher so the default name applies
        assert!(name.storage_key.is_none());

        for id in [keys::DREAM_RECALL, keys::DREAM_GOAL, keys::SLEEP_CONCERN] {
            let step = seq.get(id).unwrap();
            assert!(step.required, "{id} must be required");
            assert!(step.storage_key.is_some());
        }
    }

    #[test]
    fn only_reminders_requests_permission() {
        let seq = onboarding_steps().unwrap();
        let asking: Vec<_> = seq
            .steps()
            .iter()
            .filter(|s| s.requests_permission)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(asking, vec![keys::NOTIFICATIONS]);
    }
}
