//! Conversation handler
//!
//! Drives each user through the survey: start commands (re)initialize the
//! session, answers are validated by the current step, rejections
//! re-prompt without advancing, and completing the final step delivers one
//! aggregated report to the operator chat and clears the user's state.
//!
//! Send failures are not caught here. They propagate to the polling
//! supervisor, which logs and retries; the user's in-memory state is left
//! as-is so the next valid message retries the same step.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::survey::answers::{SessionStore, SurveyAnswers};
use crate::survey::steps::{StepOutcome, SurveyPipeline};
use crate::telegram::api::{IncomingMessage, TelegramApi, UpdateHandler};
use crate::utils::errors::{BotError, Result};
use crate::utils::shutdown::ShutdownToken;

/// Commands that (re)start the survey from any state.
const START_COMMANDS: &[&str] = &["/start", "/start_survey", "/request_services"];

const WELCOME_TEXT: &str = "Welcome to the pickup service! \
Answer a few quick questions and we will arrange a pickup for you.";

const CLOSING_TEXT: &str = "Thank you! Your pickup request has been sent. \
We will contact you shortly to confirm.";

/// Per-user conversational state machine over the injected session store
/// and step pipeline.
pub struct ConversationHandler {
    api: Arc<dyn TelegramApi>,
    store: SessionStore,
    pipeline: Arc<SurveyPipeline>,
    operator_chat_id: i64,
}

impl ConversationHandler {
    pub fn new(
        api: Arc<dyn TelegramApi>,
        store: SessionStore,
        pipeline: Arc<SurveyPipeline>,
        operator_chat_id: i64,
    ) -> Self {
        Self {
            api,
            store,
            pipeline,
            operator_chat_id,
        }
    }

    /// (Re)start the survey: fresh session at step 0, welcome text, first
    /// prompt. Always legal, including mid-survey; prior answers are
    /// discarded.
    async fn handle_start(&self, message: &IncomingMessage) -> Result<()> {
        info!(user_id = message.user_id, "Survey (re)started");
        self.store.start(message.user_id);

        self.api
            .send_text(message.chat_id, WELCOME_TEXT, None)
            .await?;
        self.send_step_prompt(message.chat_id, 0).await
    }

    async fn send_step_prompt(&self, chat_id: i64, step_index: usize) -> Result<()> {
        let Some(step) = self.pipeline.step(step_index) else {
            return Ok(());
        };
        self.api
            .send_text(chat_id, step.prompt, step.keyboard.as_ref())
            .await?;
        Ok(())
    }

    /// Assemble and deliver the report, then clear the user's state.
    ///
    /// The store is intentionally not advanced first: if a send fails
    /// here, the user is still at the final step and the next valid
    /// answer retries finalization.
    async fn finalize(&self, message: &IncomingMessage, answers: &SurveyAnswers) -> Result<()> {
        self.api
            .send_text(message.chat_id, CLOSING_TEXT, None)
            .await?;

        let report = self.build_report(message, answers);
        let sent = self
            .api
            .send_text(self.operator_chat_id, &report, None)
            .await?;
        debug!(message_id = sent.id, "Report delivered to operator chat");

        self.store.remove(message.user_id);
        info!(user_id = message.user_id, "Survey completed");
        Ok(())
    }

    /// Sender identity block followed by every captured answer in step
    /// order.
    fn build_report(&self, message: &IncomingMessage, answers: &SurveyAnswers) -> String {
        let profile = &message.profile;
        let mut report = String::from("New pickup request\n\n");

        let _ = writeln!(report, "ID: {}", message.user_id);
        let _ = writeln!(report, "Name: {}", profile.first_name);
        let _ = writeln!(
            report,
            "Surname: {}",
            profile.last_name.as_deref().unwrap_or("not set")
        );
        let _ = match profile.username.as_deref() {
            Some(username) => writeln!(report, "Username: @{username}"),
            None => writeln!(report, "Username: not set"),
        };
        let _ = writeln!(
            report,
            "Language: {}",
            profile.language_code.as_deref().unwrap_or("not set")
        );
        let _ = writeln!(
            report,
            "Received: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );

        report.push('\n');
        for step in self.pipeline.steps() {
            let _ = writeln!(
                report,
                "{}: {}",
                step.label,
                answers.get(step.field).unwrap_or("not set")
            );
        }

        report
    }
}

#[async_trait]
impl UpdateHandler for ConversationHandler {
    async fn on_message(&self, message: IncomingMessage, _shutdown: ShutdownToken) -> Result<()> {
        let user_id = message.user_id;
        debug!(user_id, text = ?message.text, "Processing message");

        if let Some(command) = message.command() {
            if START_COMMANDS.contains(&command) {
                return self.handle_start(&message).await;
            }
        }

        let Some(mut session) = self.store.get(user_id) else {
            debug!(user_id, "No active session, ignoring message");
            return Ok(());
        };

        let Some(step) = self.pipeline.step(session.step) else {
            // Cursor past the pipeline end should be unreachable; drop the
            // stale entry instead of wedging the user.
            warn!(user_id, step = session.step, "Session cursor out of range, clearing");
            self.store.remove(user_id);
            return Ok(());
        };

        match step.apply(&message, &mut session.answers) {
            StepOutcome::Rejected {
                message: rejection,
                resend_prompt,
            } => {
                debug!(user_id, field = step.field, "Answer rejected");
                self.api
                    .send_text(message.chat_id, &rejection, None)
                    .await?;
                if resend_prompt {
                    self.send_step_prompt(message.chat_id, session.step).await?;
                }
            }
            StepOutcome::Accepted => {
                session.step += 1;
                info!(
                    user_id,
                    field = step.field,
                    step = session.step,
                    of = self.pipeline.len(),
                    "Answer accepted"
                );

                if session.step < self.pipeline.len() {
                    let next = session.step;
                    self.store.put(user_id, session);
                    self.send_step_prompt(message.chat_id, next).await?;
                } else {
                    self.finalize(&message, &session.answers).await?;
                }
            }
        }

        Ok(())
    }

    async fn on_error(&self, error: &BotError) {
        warn!(error = %error, "Transport reported an error");
    }
}
