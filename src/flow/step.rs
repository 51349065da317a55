//! Step descriptors and the ordered sequence that makes up a flow.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

use super::answer::{Answer, AnswerSet};

/// What a step asks of the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Info,
    SingleChoice,
    DateInput,
    TextInput,
    /// Pseudo-step shown while the flow is submitting.
    Loading,
    /// Pseudo-step shown once the flow has completed.
    Results,
}

impl StepKind {
    /// Whether the step collects an answer.
    pub fn is_question(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::DateInput | Self::TextInput)
    }

    /// Loading and Results live after the sequence and are never part of it.
    pub fn is_pseudo(&self) -> bool {
        matches!(self, Self::Loading | Self::Results)
    }
}

/// One selectable option of a single-choice step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOption {
    pub label: String,
    pub value: String,
}

impl StepOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Immutable description of one page of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub kind: StepKind,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<StepOption>,
    pub required: bool,
    /// Persistence key for this step's answer. Steps without one are never
    /// written out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    /// Write the answer as soon as it is set instead of at completion.
    #[serde(default)]
    pub persist_immediately: bool,
    /// Ask for notification permission the first time the user advances
    /// past this step.
    #[serde(default)]
    pub requests_permission: bool,
}

impl Step {
    fn new(id: impl Into<String>, kind: StepKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            body: String::new(),
            options: Vec::new(),
            required: false,
            storage_key: None,
            persist_immediately: false,
            requests_permission: false,
        }
    }

    pub fn info(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, StepKind::Info, title)
    }

    /// A required single-choice question.
    pub fn single_choice(
        id: impl Into<String>,
        title: impl Into<String>,
        options: Vec<StepOption>,
    ) -> Self {
        Self {
            options,
            required: true,
            ..Self::new(id, StepKind::SingleChoice, title)
        }
    }

    /// A required date question.
    pub fn date_input(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            required: true,
            ..Self::new(id, StepKind::DateInput, title)
        }
    }

    /// An optional free-text question.
    pub fn text_input(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, StepKind::TextInput, title)
    }

    /// Pseudo-step rendered while a flow is submitting.
    pub fn loading(title: impl Into<String>) -> Self {
        Self::new("loading", StepKind::Loading, title)
    }

    /// Pseudo-step rendered once a flow has completed.
    pub fn results(title: impl Into<String>) -> Self {
        Self::new("results", StepKind::Results, title)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn stored_as(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn persist_immediately(mut self) -> Self {
        self.persist_immediately = true;
        self
    }

    pub fn requests_permission(mut self) -> Self {
        self.requests_permission = true;
        self
    }

    /// Look up an option by value.
    pub fn option(&self, value: &str) -> Option<&StepOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Check that `answer` has the shape this step collects.
    pub fn accepts(&self, answer: &Answer) -> Result<(), FlowError> {
        let reject = |reason: String| FlowError::InvalidAnswer {
            step_id: self.id.clone(),
            reason,
        };
        match (self.kind, answer) {
            (StepKind::SingleChoice, Answer::Choice(value)) => {
                if self.option(value).is_some() {
                    Ok(())
                } else {
                    Err(reject(format!("{value:?} is not one of the options")))
                }
            }
            (StepKind::DateInput, Answer::Date(_)) | (StepKind::TextInput, Answer::Text(_)) => {
                Ok(())
            }
            (kind, _) if !kind.is_question() => {
                Err(reject("step does not take an answer".to_string()))
            }
            (kind, other) => Err(reject(format!("{kind:?} step cannot take {other:?}"))),
        }
    }
}

/// The ordered, validated list of content steps of a flow.
///
/// Pure configuration: build it once and share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSequence {
    steps: Vec<Step>,
}

impl StepSequence {
    /// Build a sequence, rejecting empty lists, duplicate ids, pseudo-steps,
    /// and choice steps without options.
    pub fn new(steps: Vec<Step>) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::Definition("a flow needs at least one step".into()));
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(FlowError::Definition(format!("duplicate step id {}", step.id)));
            }
            if step.kind.is_pseudo() {
                return Err(FlowError::Definition(format!(
                    "step {} uses a pseudo-step kind",
                    step.id
                )));
            }
            if step.kind == StepKind::SingleChoice && step.options.is_empty() {
                return Err(FlowError::Definition(format!(
                    "choice step {} has no options",
                    step.id
                )));
            }
        }

        Ok(Self { steps })
    }

    /// Number of content steps (Loading and Results are not counted).
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn step_at(&self, index: usize) -> Result<&Step, FlowError> {
        self.steps.get(index).ok_or(FlowError::OutOfRange {
            index,
            count: self.steps.len(),
        })
    }

    /// Whether `answers` allow moving forward past step `index`.
    ///
    /// Required steps need a non-empty answer under their id. Optional steps
    /// always pass. An out-of-range index never passes.
    pub fn is_satisfied(&self, index: usize, answers: &AnswerSet) -> bool {
        match self.steps.get(index) {
            Some(step) if step.required => answers.has_value(&step.id),
            Some(_) => true,
            None => false,
        }
    }

    pub fn get(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> StepSequence {
        StepSequence::new(vec![
            Step::info("intro", "Welcome"),
            Step::text_input("name", "What should we call you?"),
            Step::single_choice(
                "recall",
                "How often do you remember dreams?",
                vec![StepOption::new("Never", "never"), StepOption::new("Often", "often")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn step_count_excludes_pseudo_steps() {
        assert_eq!(sample().step_count(), 3);
        assert_eq!(sample().last_index(), 2);
    }

    #[test]
    fn step_at_rejects_out_of_range() {
        let seq = sample();
        assert_eq!(seq.step_at(0).unwrap().id, "intro");
        let err = seq.step_at(3).unwrap_err();
        assert!(matches!(err, FlowError::OutOfRange { index: 3, count: 3 }));
    }

    #[test]
    fn is_satisfied_gates_required_steps_only() {
        let seq = sample();
        let mut answers = AnswerSet::new();

        assert!(seq.is_satisfied(0, &answers), "info steps never block");
        assert!(seq.is_satisfied(1, &answers), "optional text never blocks");
        assert!(!seq.is_satisfied(2, &answers));

        answers.insert("recall", Answer::choice(""));
        assert!(!seq.is_satisfied(2, &answers), "blank choice is not an answer");

        answers.insert("recall", Answer::choice("often"));
        assert!(seq.is_satisfied(2, &answers));
        assert!(!seq.is_satisfied(99, &answers));
    }

    #[test]
    fn new_rejects_bad_definitions() {
        assert!(StepSequence::new(vec![]).is_err());
        assert!(
            StepSequence::new(vec![Step::info("a", "A"), Step::info("a", "B")]).is_err()
        );
        assert!(StepSequence::new(vec![Step::single_choice("c", "C", vec![])]).is_err());
        assert!(StepSequence::new(vec![Step::loading("Loading")]).is_err());
    }

    #[test]
    fn builders_set_flags() {
        let step = Step::date_input("birth_date", "Birth date")
            .stored_as("profile.birth_date")
            .persist_immediately();
        assert!(step.required);
        assert!(step.persist_immediately);
        assert_eq!(step.storage_key.as_deref(), Some("profile.birth_date"));

        let info = Step::info("reminders", "Reminders").requests_permission();
        assert!(!info.required);
        assert!(info.requests_permission);
    }

    #[test]
    fn step_and_option_lookup() {
        let seq = sample();
        assert!(seq.get("nope").is_none());
        let recall = seq.get("recall").unwrap();
        assert_eq!(recall.option("often").unwrap().label, "Often");
        assert!(recall.option("sometimes").is_none());
    }

    #[test]
    fn accepts_checks_shape_and_options() {
        let seq = sample();
        let recall = seq.get("recall").unwrap();
        assert!(recall.accepts(&Answer::choice("often")).is_ok());
        assert!(matches!(
            recall.accepts(&Answer::choice("sometimes")),
            Err(FlowError::InvalidAnswer { .. })
        ));
        assert!(recall.accepts(&Answer::text("often")).is_err());

        let name = seq.get("name").unwrap();
        assert!(name.accepts(&Answer::text("")).is_ok());
        assert!(
            name.accepts(&Answer::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()))
                .is_err()
        );

        let intro = seq.get("intro").unwrap();
        let err = intro.accepts(&Answer::text("hi")).unwrap_err();
        assert!(err.to_string().contains("does not take an answer"));
    }
}
