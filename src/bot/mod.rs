//! Telegram transport: context implementation and update handlers.

/// Inbound message handling and the [`crate::context::ChatContext`]
/// implementation for Telegram
pub mod handlers;

pub use handlers::{handle_message, TelegramContext};
