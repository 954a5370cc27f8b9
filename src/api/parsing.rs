//! Turning raw Bot API updates into inbound events.

use crate::core::models::{
    ButtonPress, ChatId, InboundEvent, InboundPost, MessageId, PrivateText,
};
use crate::telegram::types::{Message, Update};

/// Payload prefix of the note deep-link (`/start note_<id>`).
pub const NOTE_PAYLOAD_PREFIX: &str = "note_";

/// What a private text asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateCommand {
    /// `/start note_<id>`: the user opened the note deep-link.
    StartNote(MessageId),
    /// `/start` with no (or an unrecognised) payload.
    Start,
    Cancel,
    /// Anything else; a note body when one is pending.
    Text(String),
}

#[must_use]
pub fn note_deep_link(bot_username: &str, unit: MessageId) -> String {
    format!(
        "https://t.me/{}?start={NOTE_PAYLOAD_PREFIX}{unit}",
        bot_username.trim_start_matches('@')
    )
}

/// Split `/cmd@botname args` into `("cmd", "args")`.
fn split_command(text: &str) -> Option<(&str, &str)> {
    let rest = text.trim().strip_prefix('/')?;
    let (head, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let name = head.split('@').next().unwrap_or(head);
    Some((name, args.trim()))
}

#[must_use]
pub fn parse_private_command(text: &str) -> PrivateCommand {
    match split_command(text) {
        Some(("start", payload)) => payload
            .strip_prefix(NOTE_PAYLOAD_PREFIX)
            .and_then(|id| id.parse::<MessageId>().ok())
            .map_or(PrivateCommand::Start, PrivateCommand::StartNote),
        Some(("cancel", _)) => PrivateCommand::Cancel,
        _ => PrivateCommand::Text(text.to_string()),
    }
}

fn post_from(message: &Message) -> Option<InboundEvent> {
    let text = message.body()?;
    // Posts signed by a chat (channels, anonymous admins) carry no user identity.
    let author_id = if message.sender_chat.is_some() {
        None
    } else {
        message.from.as_ref().map(|u| u.id)
    };
    Some(InboundEvent::Post(InboundPost {
        chat_id: message.chat.id,
        message_id: message.message_id,
        author_id,
        text: text.to_string(),
    }))
}

/// Classify an update. Returns `None` for anything the bot does not react to.
#[must_use]
pub fn classify_update(update: &Update, source_chat_id: ChatId) -> Option<InboundEvent> {
    if let Some(query) = &update.callback_query {
        return Some(InboundEvent::Press(ButtonPress {
            press_id: query.id.clone(),
            chat_id: query.message.as_ref().map(|m| m.chat.id),
            message_id: query.message.as_ref().map(|m| m.message_id),
            user_id: query.from.id,
            data: query.data.clone().unwrap_or_default(),
        }));
    }

    let message = update.channel_post.as_ref().or(update.message.as_ref())?;
    if message.chat.id == source_chat_id {
        return post_from(message);
    }

    if message.chat.is_private() {
        let user = message.from.as_ref()?;
        if user.is_bot {
            return None;
        }
        return Some(InboundEvent::Private(PrivateText {
            chat_id: message.chat.id,
            user_id: user.id,
            text: message.text.clone()?,
        }));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_payloads() {
        assert_eq!(parse_private_command("/start note_42"), PrivateCommand::StartNote(42));
        assert_eq!(parse_private_command("/start@digest_bot note_7"), PrivateCommand::StartNote(7));
        assert_eq!(parse_private_command("/start"), PrivateCommand::Start);
        assert_eq!(parse_private_command("/start note_x"), PrivateCommand::Start);
        assert_eq!(parse_private_command("/cancel"), PrivateCommand::Cancel);
        assert_eq!(
            parse_private_command("great article"),
            PrivateCommand::Text("great article".into())
        );
    }

    #[test]
    fn deep_link_strips_at_sign() {
        assert_eq!(
            note_deep_link("@digest_bot", 12),
            "https://t.me/digest_bot?start=note_12"
        );
    }
}
