//! Biorhythm wizard pages.

use crate::error::FlowError;
use crate::flow::{Step, StepOption, StepSequence};
use crate::scoring::keys::*;

use super::settings_keys;

pub const INTRO: &str = "intro";

/// Intro, birth date, then the three quiz questions the score adjusts on.
pub fn biorhythm_steps() -> Result<StepSequence, FlowError> {
    StepSequence::new(vec![
        Step::info(INTRO, "Biorhythm analysis").with_body(
            "Your dreams follow a nine-day rhythm that starts on the day you were born. \
             Answer a few questions and we'll read where you are in the cycle.",
        ),
        Step::date_input(BIRTH_DATE, "When were you born?")
            .with_body("Your birth date sets the starting point of your cycle.")
            .stored_as(settings_keys::BIRTH_DATE)
            .persist_immediately(),
        Step::single_choice(
            DREAM_FREQUENCY,
            "How often do you remember your dreams?",
            vec![
                StepOption::new("Never", DREAMS_NEVER),
                StepOption::new("Rarely", DREAMS_RARELY),
                StepOption::new("Sometimes", DREAMS_SOMETIMES),
                StepOption::new("Often", DREAMS_OFTEN),
                StepOption::new("Each night", DREAMS_EACH_NIGHT),
            ],
        )
        .stored_as(settings_keys::DREAM_FREQUENCY),
        Step::single_choice(
            NIGHTMARE_FREQUENCY,
            "How many of your dreams are nightmares?",
            vec![
                StepOption::new("None", NIGHTMARES_NONE),
                StepOption::new("A few", NIGHTMARES_FEW),
                StepOption::new("About half", NIGHTMARES_HALF),
                StepOption::new("Most of them", NIGHTMARES_MOST),
                StepOption::new("Each one", NIGHTMARES_EACH_ONE),
            ],
        )
        .stored_as(settings_keys::NIGHTMARE_FREQUENCY),
        Step::single_choice(
            SLEEP_DURATION,
            "How long do you usually sleep?",
            vec![
                StepOption::new("< 5 hours", SLEEP_UNDER_5),
                StepOption::new("5-7 hours", SLEEP_5_TO_7),
                StepOption::new("7-9 hours", SLEEP_7_TO_9),
                StepOption::new("> 9 hours", SLEEP_OVER_9),
            ],
        )
        .stored_as(settings_keys::SLEEP_DURATION),
    ])
}
