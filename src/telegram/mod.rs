//! Telegram Bot API integration

pub mod client;
pub mod markup;
pub mod messenger;
pub mod types;

pub use client::TelegramClient;
pub use messenger::Messenger;
pub use types::{InlineKeyboard, PressAnswer, TextFormat};
