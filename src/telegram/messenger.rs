use async_trait::async_trait;

use super::types::{InlineKeyboard, PressAnswer, TextFormat};
use crate::core::models::{ChatId, MessageId};
use crate::errors::DigestError;

/// Outbound side of the messaging platform.
///
/// Private messages are sent with `send_message` addressed to the user's id,
/// which Telegram uses as the private chat id.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a new message and return its id.
    ///
    /// Returns `DigestError::RenderRejected` when the platform refuses the markup.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, DigestError>;

    /// Replace text and controls of an existing message. Editing to identical
    /// content succeeds.
    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), DigestError>;

    /// Replace only the controls of an existing message; `None` removes them.
    async fn edit_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), DigestError>;

    /// Acknowledge a button press.
    async fn answer_press(&self, press_id: &str, answer: &PressAnswer) -> Result<(), DigestError>;
}
