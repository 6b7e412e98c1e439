//! Error handling for the pickup bot
//!
//! This module defines the main error type used throughout the application
//! and provides a unified error handling strategy: transport failures are
//! recoverable and retried by the polling supervisor, configuration
//! failures are fatal at startup.

use thiserror::Error;

/// Main error type for the pickup bot
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}

/// Result type alias for pickup bot operations
pub type Result<T> = std::result::Result<T, BotError>;

impl BotError {
    /// Check if the error is recoverable by the supervisor's retry loop
    pub fn is_recoverable(&self) -> bool {
        match self {
            BotError::Telegram(_) => true,
            BotError::Io(_) => true,
            BotError::Config(_) => false,
            BotError::InvalidInput(_) => false,
        }
    }
}
