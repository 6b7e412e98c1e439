//! Step pipeline
//!
//! The questionnaire is an ordered list of immutable step definitions,
//! built once at startup. Each step carries its prompt, an optional reply
//! keyboard, and a validate-and-apply function over the inbound message
//! and the user's answers. The step count is data, not an assumption:
//! deployments swap in shorter or longer pipelines.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::answers::SurveyAnswers;
use crate::telegram::api::{IncomingMessage, KeyboardButtonSpec, ReplyKeyboardSpec};

/// Result of applying one step to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The answer was captured; the cursor may advance.
    Accepted,
    /// The answer was refused; the user stays on the same step.
    Rejected {
        message: String,
        /// Re-send the step prompt (and keyboard) after the rejection,
        /// used by fixed-choice steps
        resend_prompt: bool,
    },
}

type StepApply = Arc<dyn Fn(&IncomingMessage, &mut SurveyAnswers) -> StepOutcome + Send + Sync>;

/// One stage of the questionnaire.
#[derive(Clone)]
pub struct StepDefinition {
    /// Answer slot this step fills
    pub field: &'static str,
    /// Human-readable label used in the operator report
    pub label: &'static str,
    pub prompt: &'static str,
    pub keyboard: Option<ReplyKeyboardSpec>,
    apply: StepApply,
}

impl StepDefinition {
    /// Apply this step's validator to an inbound message, writing the
    /// answer slot on acceptance.
    pub fn apply(&self, message: &IncomingMessage, answers: &mut SurveyAnswers) -> StepOutcome {
        (self.apply)(message, answers)
    }

    /// A step that accepts any non-empty text verbatim.
    pub fn free_text(field: &'static str, label: &'static str, prompt: &'static str) -> Self {
        Self {
            field,
            label,
            prompt,
            keyboard: None,
            apply: Arc::new(move |message, answers| {
                match message.text.as_deref().map(str::trim) {
                    Some(text) if !text.is_empty() => {
                        answers.set(field, text);
                        StepOutcome::Accepted
                    }
                    _ => StepOutcome::Rejected {
                        message: "Please send a text reply.".to_string(),
                        resend_prompt: false,
                    },
                }
            }),
        }
    }

    /// A step that accepts a Ukrainian mobile number, as text or as a
    /// shared contact, and stores it normalized to `+380XXXXXXXXX`.
    pub fn phone(field: &'static str, label: &'static str, prompt: &'static str) -> Self {
        Self {
            field,
            label,
            prompt,
            keyboard: Some(ReplyKeyboardSpec {
                rows: vec![vec![KeyboardButtonSpec::contact("Share my phone number")]],
                resize: true,
                one_time: true,
            }),
            apply: Arc::new(move |message, answers| {
                let raw = message
                    .contact_phone
                    .as_deref()
                    .or(message.text.as_deref())
                    .unwrap_or("");
                match normalize_phone(raw) {
                    Some(phone) => {
                        answers.set(field, phone);
                        StepOutcome::Accepted
                    }
                    None => StepOutcome::Rejected {
                        message: PHONE_FORMAT_HINT.to_string(),
                        resend_prompt: false,
                    },
                }
            }),
        }
    }

    /// A step that accepts exactly one of a fixed option set, offered as
    /// a reply keyboard. Unknown input re-sends the prompt with the
    /// keyboard.
    pub fn choice(
        field: &'static str,
        label: &'static str,
        prompt: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            field,
            label,
            prompt,
            keyboard: Some(ReplyKeyboardSpec::from_options(options.iter().copied())),
            apply: Arc::new(move |message, answers| {
                let text = message.text.as_deref().map(str::trim).unwrap_or("");
                if options.iter().any(|option| *option == text) {
                    answers.set(field, text);
                    StepOutcome::Accepted
                } else {
                    StepOutcome::Rejected {
                        message: "Please choose one of the options below.".to_string(),
                        resend_prompt: true,
                    }
                }
            }),
        }
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("field", &self.field)
            .field("label", &self.label)
            .field("prompt", &self.prompt)
            .field("keyboard", &self.keyboard)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable questionnaire definition.
#[derive(Debug, Clone)]
pub struct SurveyPipeline {
    steps: Vec<StepDefinition>,
}

impl SurveyPipeline {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self { steps }
    }

    /// The standard five-step pickup request deployment.
    pub fn standard() -> Self {
        Self::new(vec![
            StepDefinition::free_text(
                "subscription",
                "Subscription",
                "Which pickup plan would you like: one-time, weekly or monthly?",
            ),
            StepDefinition::free_text(
                "address",
                "Address",
                "What address should we pick up from?",
            ),
            StepDefinition::free_text(
                "pickup_time",
                "Pickup time",
                "When is a convenient pickup time?",
            ),
            StepDefinition::phone(
                "phone",
                "Phone",
                "What phone number can we reach you on? You can type it or share your contact.",
            ),
            StepDefinition::choice(
                "payment",
                "Payment",
                "How would you like to pay?",
                PAYMENT_OPTIONS,
            ),
        ])
    }

    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Payment options offered by the fixed-choice payment step.
pub const PAYMENT_OPTIONS: &[&str] = &["Cash", "Card"];

/// Rejection message for malformed phone numbers.
pub const PHONE_FORMAT_HINT: &str = "That does not look like a Ukrainian mobile number. \
Accepted formats: +380931234567, 380931234567 or 0931234567.";

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+380|380|0)(\d{9})$").unwrap());

/// Normalize a Ukrainian mobile number to `+380XXXXXXXXX`.
///
/// Whitespace is stripped first, so `+380 93 123 45 67` is accepted.
/// Returns `None` for anything that is not a Ukrainian mobile number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let captures = PHONE_PATTERN.captures(&compact)?;
    Some(format!("+380{}", &captures[1]))
}
