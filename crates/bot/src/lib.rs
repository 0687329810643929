// Bot crate clippy configuration
// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Gatekeeper Bot Library
//!
//! This crate contains the Telegram-facing components of the bot: the
//! long-poll dispatcher, the command handlers, the expiry sweeper task,
//! and the Bot API client that doubles as the membership gateway.

pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod state;
pub mod sweeper;
pub mod telegram;

pub use config::Config;
pub use state::BotState;
pub use telegram::TelegramClient;
