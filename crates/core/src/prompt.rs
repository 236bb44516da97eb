//! Prompt construction for the AI script writer.
//!
//! [`build_script_prompt`] substitutes each wizard answer into a fixed
//! template, once, in wizard order. It is deterministic and side-effect
//! free.

use crate::error::CoreError;
use crate::wizard::{self, WizardAnswers};

/// System message sent alongside every script prompt.
pub const SYSTEM_PROMPT: &str = "You are an award-winning local radio copywriter. \
You write short spoken sales pitches that sound natural when read aloud by a \
single voice actor. Reply with the script text only.";

/// Target spoken length of a pitch, in words.
pub const TARGET_WORDS_MIN: u32 = 120;
pub const TARGET_WORDS_MAX: u32 = 180;

/// Prompt label for each wizard answer, in wizard order.
const DETAIL_LABELS: [(&str, &str); 8] = [
    (wizard::KEY_BUSINESS_NAME, "Business name"),
    (wizard::KEY_BUSINESS_TYPE, "Kind of business"),
    (wizard::KEY_LOCATION, "Location"),
    (wizard::KEY_TARGET_CUSTOMER, "Ideal customer"),
    (wizard::KEY_OFFER, "Deal being promoted"),
    (wizard::KEY_DIFFERENTIATOR, "What sets it apart"),
    (wizard::KEY_TONE, "Tone of voice"),
    (wizard::KEY_CALL_TO_ACTION, "Closing call to action"),
];

const RULES: &str = "Rules:\n\
- Mention the business name in the opening and closing lines.\n\
- State the deal clearly and end with the call to action.\n\
- Plain sentences only: no headings, bullet points, emojis or stage directions.";

/// Build the user prompt for the script writer from a complete answer set.
///
/// Fails with [`CoreError::IncompleteAnswers`] when any wizard question is
/// unanswered. Answers are trimmed before substitution.
pub fn build_script_prompt(answers: &WizardAnswers) -> Result<String, CoreError> {
    let missing = wizard::missing_keys(answers);
    if !missing.is_empty() {
        return Err(CoreError::IncompleteAnswers { missing });
    }

    let details: String = DETAIL_LABELS
        .iter()
        .map(|(key, label)| {
            let answer = answers.get(key).map(str::trim).unwrap_or_default();
            format!("{label}: {answer}\n")
        })
        .collect();

    Ok(format!(
        "Write a spoken sales pitch of {TARGET_WORDS_MIN} to {TARGET_WORDS_MAX} words \
for a local business, using the details below.\n\n{details}\n{RULES}"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
