//! Pickup Bot
//!
//! A Telegram bot that walks customers through a short pickup service
//! request survey: subscription choice, address, pickup time, phone number
//! and payment method. Completed requests are delivered as a single report
//! to an operator chat.
//!
//! The crate is split into a resilient polling supervisor, a per-user
//! conversational state machine, and a trait-based Telegram transport seam
//! so the whole conversation flow is testable without the network.

pub mod config;
pub mod handlers;
pub mod polling;
pub mod survey;
pub mod telegram;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{BotError, Result};

// Re-export main components for easy access
pub use handlers::ConversationHandler;
pub use polling::PollingSupervisor;
pub use survey::{SessionStore, SurveyPipeline};
pub use telegram::{BotClient, TelegramApi, UpdateHandler};
pub use utils::shutdown::{self, ShutdownHandle, ShutdownToken};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
