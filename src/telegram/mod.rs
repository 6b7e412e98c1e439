//! Telegram transport seam
//!
//! The rest of the crate talks to Telegram exclusively through the
//! [`TelegramApi`] trait; [`BotClient`] is the teloxide-backed production
//! implementation. Tests substitute an in-memory transport.

pub mod api;
pub mod client;

pub use api::{
    BotIdentity, IncomingMessage, KeyboardButtonSpec, ReplyKeyboardSpec, SenderProfile,
    SentMessage, TelegramApi, UpdateHandler,
};
pub use client::BotClient;
