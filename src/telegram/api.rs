//! Transport traits and wire types
//!
//! [`TelegramApi`] is the outbound surface the bot consumes: identity
//! lookup, text/keyboard delivery and the blocking receive primitive.
//! [`UpdateHandler`] is the inbound callback the transport drives with one
//! message at a time. Both are object-safe so the conversation flow can be
//! exercised against an in-memory transport in tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::utils::errors::{BotError, Result};
use crate::utils::shutdown::ShutdownToken;

/// Bot identity, used for startup logging.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: i64,
    pub username: String,
}

/// Handle to a delivered message.
#[derive(Debug, Clone, Copy)]
pub struct SentMessage {
    pub id: i32,
}

/// Profile of the message sender, carried into the operator report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderProfile {
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

/// One inbound update, reduced to the fields the survey needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub user_id: i64,
    pub chat_id: i64,
    /// Message text, if any
    pub text: Option<String>,
    /// Phone number from a shared contact, if any
    pub contact_phone: Option<String>,
    pub profile: SenderProfile,
}

impl IncomingMessage {
    /// The leading command token with any `@botname` suffix stripped,
    /// or `None` when the message does not start with a command.
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?;
        let token = text.split_whitespace().next()?;
        if !token.starts_with('/') {
            return None;
        }
        Some(token.split('@').next().unwrap_or(token))
    }
}

/// One button of a reply keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardButtonSpec {
    pub label: String,
    /// Ask the client to send the user's own contact instead of text
    pub request_contact: bool,
}

impl KeyboardButtonSpec {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_contact: false,
        }
    }

    pub fn contact(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_contact: true,
        }
    }
}

/// A reply keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboardSpec {
    pub rows: Vec<Vec<KeyboardButtonSpec>>,
    pub resize: bool,
    pub one_time: bool,
}

impl ReplyKeyboardSpec {
    /// One-button-per-row keyboard from plain text labels.
    pub fn from_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: options
                .into_iter()
                .map(|label| vec![KeyboardButtonSpec::text(label)])
                .collect(),
            resize: true,
            one_time: true,
        }
    }
}

/// Inbound update callback, invoked by the transport's receive loop.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    /// Handle one inbound message. Errors propagate out of the receive
    /// call to the polling supervisor.
    async fn on_message(&self, message: IncomingMessage, shutdown: ShutdownToken) -> Result<()>;

    /// Observe a transport-internal failure. Logging only; retry control
    /// stays with the polling supervisor.
    async fn on_error(&self, error: &BotError);
}

/// Outbound Telegram surface consumed by the bot core.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Fetch the bot's own identity. Used only for startup logging.
    async fn identity(&self) -> Result<BotIdentity>;

    /// Send a text message, optionally with a reply keyboard.
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardSpec>,
    ) -> Result<SentMessage>;

    /// Block until updates arrive and feed them to `handler`, one at a
    /// time, until cancellation (returns `Ok`) or a transport failure
    /// (returns `Err`). Updates enqueued before the call are discarded.
    async fn receive(
        &self,
        handler: Arc<dyn UpdateHandler>,
        shutdown: ShutdownToken,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with_text(text: &str) -> IncomingMessage {
        IncomingMessage {
            user_id: 1,
            chat_id: 1,
            text: Some(text.to_string()),
            contact_phone: None,
            profile: SenderProfile::default(),
        }
    }

    #[test]
    fn command_extraction_strips_bot_suffix() {
        assert_eq!(message_with_text("/start").command(), Some("/start"));
        assert_eq!(
            message_with_text("/start_survey@pickup_test_bot").command(),
            Some("/start_survey")
        );
        assert_eq!(
            message_with_text("/request_services extra words").command(),
            Some("/request_services")
        );
    }

    #[test]
    fn non_commands_have_no_command() {
        assert_eq!(message_with_text("hello").command(), None);
        assert_eq!(message_with_text("  ").command(), None);
        let mut msg = message_with_text("x");
        msg.text = None;
        assert_eq!(msg.command(), None);
    }

    #[test]
    fn options_keyboard_is_one_button_per_row() {
        let keyboard = ReplyKeyboardSpec::from_options(["Cash", "Card"]);
        assert_eq!(keyboard.rows.len(), 2);
        assert_eq!(keyboard.rows[0][0].label, "Cash");
        assert!(!keyboard.rows[0][0].request_contact);
        assert!(keyboard.resize);
        assert!(keyboard.one_time);
    }
}
