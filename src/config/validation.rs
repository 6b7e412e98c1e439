//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured. Validation
//! failures are fatal at startup; the bot never runs half-configured.

use super::Settings;
use crate::utils::errors::{BotError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_logging_config(&settings.logging)?;
    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(BotError::Config("Bot token is required".to_string()));
    }

    if config.operator_chat_id == 0 {
        return Err(BotError::Config(
            "Operator chat id is required".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(BotError::Config("Log level is required".to_string()));
    }

    Ok(())
}
