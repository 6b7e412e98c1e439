//! Utility modules
//!
//! Error types, logging setup and the cooperative shutdown token.

pub mod errors;
pub mod logging;
pub mod shutdown;

pub use errors::{BotError, Result};
pub use shutdown::{ShutdownHandle, ShutdownToken};
