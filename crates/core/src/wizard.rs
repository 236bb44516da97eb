//! The fixed 8-question pitch wizard.
//!
//! Defines the question keys (in the order the prompt template consumes
//! them), the [`WizardAnswers`] mapping persisted on every generation
//! record, and validation helpers shared by the API and the workflow.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Question keys
// ---------------------------------------------------------------------------

pub const KEY_BUSINESS_NAME: &str = "business_name";
pub const KEY_BUSINESS_TYPE: &str = "business_type";
pub const KEY_LOCATION: &str = "location";
pub const KEY_TARGET_CUSTOMER: &str = "target_customer";
pub const KEY_OFFER: &str = "offer";
pub const KEY_DIFFERENTIATOR: &str = "differentiator";
pub const KEY_TONE: &str = "tone";
pub const KEY_CALL_TO_ACTION: &str = "call_to_action";

/// Every question key, in wizard (and prompt template) order.
pub const QUESTION_KEYS: [&str; 8] = [
    KEY_BUSINESS_NAME,
    KEY_BUSINESS_TYPE,
    KEY_LOCATION,
    KEY_TARGET_CUSTOMER,
    KEY_OFFER,
    KEY_DIFFERENTIATOR,
    KEY_TONE,
    KEY_CALL_TO_ACTION,
];

/// Maximum length of a single answer (characters).
pub const MAX_ANSWER_LENGTH: usize = 1_000;

/// Maximum length of a user-edited script (characters).
pub const MAX_SCRIPT_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// A wizard question as rendered by the UI.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WizardQuestion {
    pub key: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
}

pub const QUESTIONS: [WizardQuestion; 8] = [
    WizardQuestion {
        key: KEY_BUSINESS_NAME,
        label: "What is the name of your business?",
        placeholder: "Rosa's Bakery",
    },
    WizardQuestion {
        key: KEY_BUSINESS_TYPE,
        label: "What kind of business is it?",
        placeholder: "Family-run bakery and coffee shop",
    },
    WizardQuestion {
        key: KEY_LOCATION,
        label: "Where are you located?",
        placeholder: "Main Street, downtown Springfield",
    },
    WizardQuestion {
        key: KEY_TARGET_CUSTOMER,
        label: "Who is your ideal customer?",
        placeholder: "Commuters grabbing breakfast on the way to work",
    },
    WizardQuestion {
        key: KEY_OFFER,
        label: "What deal are you promoting?",
        placeholder: "Buy one pastry, get a coffee free before 9am",
    },
    WizardQuestion {
        key: KEY_DIFFERENTIATOR,
        label: "What makes you different from competitors?",
        placeholder: "Everything is baked on site every morning",
    },
    WizardQuestion {
        key: KEY_TONE,
        label: "What tone should the pitch have?",
        placeholder: "Warm and upbeat",
    },
    WizardQuestion {
        key: KEY_CALL_TO_ACTION,
        label: "What should listeners do next?",
        placeholder: "Show this deal at the counter",
    },
];

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// Ordered mapping of question key to free-text answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WizardAnswers(IndexMap<String, String>);

impl WizardAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the answer for `key`.
    pub fn insert(&mut self, key: impl Into<String>, answer: impl Into<String>) {
        self.0.insert(key.into(), answer.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WizardAnswers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Question keys with no answer or a whitespace-only answer, in wizard order.
pub fn missing_keys(answers: &WizardAnswers) -> Vec<&'static str> {
    QUESTION_KEYS
        .iter()
        .copied()
        .filter(|key| answers.get(key).map_or(true, |a| a.trim().is_empty()))
        .collect()
}

/// Validate a full set of wizard answers.
///
/// - Unknown keys are rejected.
/// - Every question must have a non-blank answer ([`CoreError::IncompleteAnswers`]).
/// - No answer may exceed [`MAX_ANSWER_LENGTH`] characters.
pub fn validate_answers(answers: &WizardAnswers) -> Result<(), CoreError> {
    let unknown: Vec<&str> = answers
        .iter()
        .map(|(key, _)| key)
        .filter(|key| !QUESTION_KEYS.contains(key))
        .collect();
    if !unknown.is_empty() {
        return Err(CoreError::Validation(format!(
            "Unknown question keys: {}. Must be one of: {}",
            unknown.join(", "),
            QUESTION_KEYS.join(", ")
        )));
    }

    let missing = missing_keys(answers);
    if !missing.is_empty() {
        return Err(CoreError::IncompleteAnswers { missing });
    }

    for (key, answer) in answers.iter() {
        let len = answer.trim().chars().count();
        if len > MAX_ANSWER_LENGTH {
            return Err(CoreError::Validation(format!(
                "Answer for '{key}' exceeds maximum length of {MAX_ANSWER_LENGTH} characters (got {len})"
            )));
        }
    }

    Ok(())
}

/// Trim every answer and reorder the mapping into wizard order.
///
/// Call after [`validate_answers`]; keys outside the wizard are dropped.
pub fn normalize_answers(answers: &WizardAnswers) -> WizardAnswers {
    QUESTION_KEYS
        .iter()
        .filter_map(|key| answers.get(key).map(|a| (*key, a.trim())))
        .collect()
}

/// Validate a user-edited script.
pub fn validate_script_text(text: &str) -> Result<(), CoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Script text must not be empty".to_string(),
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_SCRIPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Script exceeds maximum length of {MAX_SCRIPT_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
