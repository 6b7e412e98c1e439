//! Survey state and step pipeline
//!
//! [`SessionStore`] holds every user's in-progress questionnaire;
//! [`SurveyPipeline`] is the ordered list of step definitions that drives
//! prompting and validation.

pub mod answers;
pub mod steps;

pub use answers::{SessionStore, SurveyAnswers, SurveySession};
pub use steps::{StepDefinition, StepOutcome, SurveyPipeline};
