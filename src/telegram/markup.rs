//! Inline keyboards attached to digest messages.

use super::types::{InlineButton, InlineKeyboard};
use crate::core::models::ControlAction;

fn button(label: &str, action: ControlAction) -> InlineButton {
    InlineButton::callback(label, action.token())
}

/// 👍 / 👎 under a fresh summary.
#[must_use]
pub fn rating_keyboard() -> InlineKeyboard {
    InlineKeyboard::row(vec![
        button("👍", ControlAction::Rate(true)),
        button("👎", ControlAction::Rate(false)),
    ])
}

#[must_use]
pub fn retry_keyboard() -> InlineKeyboard {
    InlineKeyboard::row(vec![button("🔄 Retry", ControlAction::Retry)])
}

/// Controls after a rating: a single note action that echoes the choice.
#[must_use]
pub fn rated_keyboard(positive: bool) -> InlineKeyboard {
    let mark = if positive { "👍" } else { "👎" };
    InlineKeyboard::row(vec![button(
        &format!("{mark} Rated · 📝 Add note"),
        ControlAction::AddNote,
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboards_carry_control_tokens() {
        assert_eq!(rating_keyboard().callback_tokens(), vec!["rate_up", "rate_down"]);
        assert_eq!(retry_keyboard().callback_tokens(), vec!["retry"]);
        assert_eq!(rated_keyboard(false).callback_tokens(), vec!["note"]);
    }

    #[test]
    fn rated_keyboard_marks_the_choice() {
        assert!(rated_keyboard(true).inline_keyboard[0][0].text.starts_with("👍"));
        assert!(rated_keyboard(false).inline_keyboard[0][0].text.starts_with("👎"));
    }
}
