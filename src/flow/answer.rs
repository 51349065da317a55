//! Answers collected by a flow, keyed by step id.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::StoredValue;

/// One typed answer to a question step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// The `value` of the selected option.
    Choice(String),
    Date(NaiveDate),
    Text(String),
}

impl Answer {
    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Blank choices and whitespace-only text do not satisfy a required step.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Choice(v) | Self::Text(v) => v.trim().is_empty(),
            Self::Date(_) => false,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&Answer> for StoredValue {
    fn from(answer: &Answer) -> Self {
        match answer {
            Answer::Choice(v) | Answer::Text(v) => StoredValue::Text(v.clone()),
            Answer::Date(d) => StoredValue::Date(*d),
        }
    }
}

/// Answers for one flow instance. Ordered by step id so snapshots and
/// persistence batches are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, Answer>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the answer for `step_id`.
    pub fn insert(&mut self, step_id: impl Into<String>, answer: Answer) -> Option<Answer> {
        self.0.insert(step_id.into(), answer)
    }

    pub fn get(&self, step_id: &str) -> Option<&Answer> {
        self.0.get(step_id)
    }

    /// True when a non-empty answer exists for `step_id`.
    pub fn has_value(&self, step_id: &str) -> bool {
        self.get(step_id).is_some_and(|a| !a.is_empty())
    }

    pub fn choice(&self, step_id: &str) -> Option<&str> {
        self.get(step_id).and_then(Answer::as_choice)
    }

    pub fn date(&self, step_id: &str) -> Option<NaiveDate> {
        self.get(step_id).and_then(Answer::as_date)
    }

    pub fn text(&self, step_id: &str) -> Option<&str> {
        self.get(step_id).and_then(Answer::as_text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Answer)> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Answer)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, Answer)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
