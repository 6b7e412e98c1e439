//! Message handlers module
//!
//! The conversation handler consumes inbound messages one at a time and
//! drives the per-user survey state machine.

pub mod messages;

pub use messages::ConversationHandler;
