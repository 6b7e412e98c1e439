//! Teloxide-backed transport implementation
//!
//! Long-polls `getUpdates` and converts raw updates into the crate's
//! [`IncomingMessage`] shape. Updates enqueued before the receive loop
//! starts are discarded, so a restart never replays a backlog.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, ButtonRequest, ChatId, KeyboardButton, KeyboardMarkup, Message, ReplyMarkup,
    Update, UpdateKind,
};
use tracing::{debug, info};

use super::api::{
    BotIdentity, IncomingMessage, ReplyKeyboardSpec, SenderProfile, SentMessage, TelegramApi,
    UpdateHandler,
};
use crate::utils::errors::{BotError, Result};
use crate::utils::shutdown::ShutdownToken;

/// Long-poll timeout, in seconds. Telegram holds the request open for up
/// to this long before returning an empty batch.
const POLL_TIMEOUT_SECS: u32 = 25;

/// Production Telegram transport built on a teloxide [`Bot`].
#[derive(Debug, Clone)]
pub struct BotClient {
    bot: Bot,
}

impl BotClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Probe for the newest pending update and return the offset that
    /// skips past it, discarding everything enqueued before this run.
    async fn discard_pending_updates(&self) -> Result<i32> {
        let pending = self
            .bot
            .get_updates()
            .offset(-1)
            .limit(1)
            .timeout(0)
            .await?;

        let offset = pending.last().map(|u| u.id.as_offset()).unwrap_or(0);
        if offset != 0 {
            debug!(offset, "Discarded pending updates");
        }
        Ok(offset)
    }
}

#[async_trait]
impl TelegramApi for BotClient {
    async fn identity(&self) -> Result<BotIdentity> {
        let me = self.bot.get_me().await?;
        Ok(BotIdentity {
            id: me.user.id.0 as i64,
            username: me.user.username.clone().unwrap_or_default(),
        })
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardSpec>,
    ) -> Result<SentMessage> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        let sent = match keyboard {
            Some(spec) => request.reply_markup(build_keyboard(spec)).await?,
            None => request.await?,
        };
        debug!(chat_id, message_id = sent.id.0, "Message sent");
        Ok(SentMessage { id: sent.id.0 })
    }

    async fn receive(
        &self,
        handler: Arc<dyn UpdateHandler>,
        shutdown: ShutdownToken,
    ) -> Result<()> {
        let me = self.bot.get_me().await?;
        info!(
            bot = me.user.username.as_deref().unwrap_or("unknown"),
            "Start receiving updates"
        );

        let mut offset = self.discard_pending_updates().await?;

        loop {
            if shutdown.is_shutdown() {
                return Ok(());
            }

            let poll = self
                .bot
                .get_updates()
                .offset(offset)
                .timeout(POLL_TIMEOUT_SECS)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::EditedMessage]);

            let updates = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                result = poll.send() => match result {
                    Ok(updates) => updates,
                    Err(err) => {
                        let err = BotError::from(err);
                        handler.on_error(&err).await;
                        return Err(err);
                    }
                },
            };

            for update in updates {
                offset = update.id.as_offset();

                let Some(message) = convert_update(update) else {
                    continue;
                };

                // Cancellation also aborts an in-flight handler send.
                tokio::select! {
                    _ = shutdown.cancelled() => return Ok(()),
                    result = handler.on_message(message, shutdown.clone()) => result?,
                }
            }
        }
    }
}

/// Reduce a raw update to the message shape the survey consumes.
/// Updates without a sender carry nothing actionable and are dropped.
fn convert_update(update: Update) -> Option<IncomingMessage> {
    let message = match update.kind {
        UpdateKind::Message(message) | UpdateKind::EditedMessage(message) => message,
        _ => {
            debug!("Skipping unsupported update kind");
            return None;
        }
    };

    convert_message(&message).or_else(|| {
        debug!(chat_id = message.chat.id.0, "Skipping message without sender");
        None
    })
}

fn convert_message(message: &Message) -> Option<IncomingMessage> {
    let from = message.from.as_ref()?;
    Some(IncomingMessage {
        user_id: from.id.0 as i64,
        chat_id: message.chat.id.0,
        text: message.text().map(str::to_owned),
        contact_phone: message.contact().map(|c| c.phone_number.clone()),
        profile: SenderProfile {
            first_name: from.first_name.clone(),
            last_name: from.last_name.clone(),
            username: from.username.clone(),
            language_code: from.language_code.clone(),
        },
    })
}

/// Map a keyboard spec onto a teloxide reply keyboard.
fn build_keyboard(spec: &ReplyKeyboardSpec) -> ReplyMarkup {
    let rows: Vec<Vec<KeyboardButton>> = spec
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    let key = KeyboardButton::new(button.label.clone());
                    if button.request_contact {
                        key.request(ButtonRequest::Contact)
                    } else {
                        key
                    }
                })
                .collect()
        })
        .collect();

    let mut markup = KeyboardMarkup::new(rows);
    if spec.resize {
        markup = markup.resize_keyboard();
    }
    if spec.one_time {
        markup = markup.one_time_keyboard();
    }
    ReplyMarkup::Keyboard(markup)
}
