//! Shared test helpers
//!
//! In-memory transport implementations and message builders used by the
//! integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pickup_bot::telegram::{
    BotIdentity, IncomingMessage, ReplyKeyboardSpec, SenderProfile, SentMessage, TelegramApi,
    UpdateHandler,
};
use pickup_bot::utils::errors::{BotError, Result};
use pickup_bot::utils::shutdown::{ShutdownHandle, ShutdownToken};

/// One message captured by the recording transport.
#[derive(Debug, Clone)]
pub struct SentRecord {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<ReplyKeyboardSpec>,
}

/// Transport that records every outbound message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingApi {
    sent: Mutex<Vec<SentRecord>>,
}

impl RecordingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SentRecord> {
        self.sent()
            .into_iter()
            .filter(|record| record.chat_id == chat_id)
            .collect()
    }

    pub fn last_sent_to(&self, chat_id: i64) -> Option<SentRecord> {
        self.sent_to(chat_id).pop()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl TelegramApi for RecordingApi {
    async fn identity(&self) -> Result<BotIdentity> {
        Ok(BotIdentity {
            id: 42,
            username: "pickup_test_bot".to_string(),
        })
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardSpec>,
    ) -> Result<SentMessage> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentRecord {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(SentMessage {
            id: sent.len() as i32,
        })
    }

    async fn receive(
        &self,
        _handler: Arc<dyn UpdateHandler>,
        _shutdown: ShutdownToken,
    ) -> Result<()> {
        Ok(())
    }
}

/// Transport whose receive call fails a fixed number of times, then
/// requests shutdown and returns cleanly. Sends always succeed.
pub struct FlakyApi {
    pub receive_calls: AtomicUsize,
    failures: usize,
    handle: Mutex<Option<ShutdownHandle>>,
    shutdown_during_failure: bool,
}

impl FlakyApi {
    /// Fail `failures` receive attempts, then shut down on the next one.
    pub fn new(failures: usize, handle: ShutdownHandle) -> Arc<Self> {
        Arc::new(Self {
            receive_calls: AtomicUsize::new(0),
            failures,
            handle: Mutex::new(Some(handle)),
            shutdown_during_failure: false,
        })
    }

    /// Fail every receive attempt, requesting shutdown from within the
    /// first failing call (models cancellation arriving mid-backoff).
    pub fn failing_with_shutdown(handle: ShutdownHandle) -> Arc<Self> {
        Arc::new(Self {
            receive_calls: AtomicUsize::new(0),
            failures: usize::MAX,
            handle: Mutex::new(Some(handle)),
            shutdown_during_failure: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    fn request_shutdown(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.shutdown();
        }
    }
}

#[async_trait]
impl TelegramApi for FlakyApi {
    async fn identity(&self) -> Result<BotIdentity> {
        Ok(BotIdentity {
            id: 42,
            username: "pickup_test_bot".to_string(),
        })
    }

    async fn send_text(
        &self,
        _chat_id: i64,
        _text: &str,
        _keyboard: Option<&ReplyKeyboardSpec>,
    ) -> Result<SentMessage> {
        Ok(SentMessage { id: 1 })
    }

    async fn receive(
        &self,
        _handler: Arc<dyn UpdateHandler>,
        _shutdown: ShutdownToken,
    ) -> Result<()> {
        let call = self.receive_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            if self.shutdown_during_failure {
                self.request_shutdown();
            }
            return Err(BotError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "simulated transport failure",
            )));
        }

        self.request_shutdown();
        Ok(())
    }
}

/// Handler that counts messages and does nothing else.
#[derive(Debug, Default)]
pub struct NoopHandler {
    pub messages: AtomicUsize,
    pub errors: AtomicUsize,
}

#[async_trait]
impl UpdateHandler for NoopHandler {
    async fn on_message(&self, _message: IncomingMessage, _shutdown: ShutdownToken) -> Result<()> {
        self.messages.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_error(&self, _error: &BotError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn test_profile() -> SenderProfile {
    SenderProfile {
        first_name: "Ivan".to_string(),
        last_name: Some("Petrenko".to_string()),
        username: Some("ivan_petrenko".to_string()),
        language_code: Some("uk".to_string()),
    }
}

/// A private-chat text message (chat id equals user id, as in Telegram
/// private chats).
pub fn text_message(user_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        user_id,
        chat_id: user_id,
        text: Some(text.to_string()),
        contact_phone: None,
        profile: test_profile(),
    }
}

/// A shared-contact message carrying a phone number and no text.
pub fn contact_message(user_id: i64, phone: &str) -> IncomingMessage {
    IncomingMessage {
        user_id,
        chat_id: user_id,
        text: None,
        contact_phone: Some(phone.to_string()),
        profile: test_profile(),
    }
}
