//! Rendering of digest messages and delivery with a plain-text fallback.

use tracing::{info, warn};

use crate::core::models::{ChatId, MessageId, UserId};
use crate::errors::DigestError;
use crate::telegram::markup::{rating_keyboard, retry_keyboard};
use crate::telegram::{InlineKeyboard, Messenger, TextFormat};
use crate::utils::html::{escape_html, html_to_plain_text, sanitize_telegram_html};
use crate::utils::truncate_chars;

/// Room left for the summary once the link and notices are appended.
pub const SUMMARY_CHAR_BUDGET: usize = 3500;
const MIN_SUMMARY_BUDGET: usize = 500;
const URL_DISPLAY_CHARS: usize = 200;

pub const TRACING_UNAVAILABLE_NOTICE: &str = "⚠️ Tracing unavailable, rating is disabled for this summary.";

/// Message text plus the controls to show under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

fn display_url(url: &str) -> String {
    let shown = truncate_chars(url, URL_DISPLAY_CHARS);
    if shown.len() < url.len() {
        format!("{}…", escape_html(shown))
    } else {
        escape_html(shown)
    }
}

#[must_use]
pub fn render_placeholder(url: &str) -> Rendered {
    Rendered {
        text: format!("⏳ Summarizing {}…", display_url(url)),
        keyboard: None,
    }
}

#[must_use]
pub fn render_retrying(url: &str) -> Rendered {
    Rendered {
        text: format!("🔄 Retrying {}…", display_url(url)),
        keyboard: None,
    }
}

#[must_use]
pub fn render_failure(url: &str, reason: &str) -> Rendered {
    Rendered {
        text: format!(
            "❌ Could not summarize {}\n<i>{}</i>",
            display_url(url),
            escape_html(reason)
        ),
        keyboard: Some(retry_keyboard()),
    }
}

/// Cut model output to the summary budget and rewrite it into the Telegram subset.
#[must_use]
pub fn fit_summary(summary: &str) -> String {
    let summary = summary.trim();
    let mut budget = SUMMARY_CHAR_BUDGET;
    loop {
        let cut = truncate_chars(summary, budget);
        let mut html = sanitize_telegram_html(cut);
        // Escaping can grow the text; shrink the cut until it fits.
        if html.chars().count() <= SUMMARY_CHAR_BUDGET || budget <= MIN_SUMMARY_BUDGET {
            if cut.len() < summary.len() {
                html.push('…');
            }
            return html;
        }
        budget /= 2;
    }
}

/// Success rendering. Without a working trace the rating controls are
/// withheld and a notice is shown instead.
#[must_use]
pub fn render_success(summary: &str, url: &str, tracing_ok: bool) -> Rendered {
    let mut text = fit_summary(summary);
    text.push_str(&format!(
        "\n\n🔗 <a href=\"{}\">Source</a>",
        escape_html(url)
    ));

    if tracing_ok {
        Rendered {
            text,
            keyboard: Some(rating_keyboard()),
        }
    } else {
        text.push_str(&format!("\n\n<i>{TRACING_UNAVAILABLE_NOTICE}</i>"));
        Rendered {
            text,
            keyboard: None,
        }
    }
}

/// Send a rendered message, re-sending as plain text if Telegram rejects the markup.
///
/// # Errors
///
/// Returns the messenger error when both attempts fail.
pub async fn send_rendered(
    messenger: &dyn Messenger,
    chat_id: ChatId,
    rendered: &Rendered,
) -> Result<MessageId, DigestError> {
    match messenger
        .send_message(chat_id, &rendered.text, TextFormat::Html, rendered.keyboard.as_ref())
        .await
    {
        Err(DigestError::RenderRejected(reason)) => {
            warn!("Markup rejected ({}), sending as plain text", reason);
            let plain = html_to_plain_text(&rendered.text);
            messenger
                .send_message(chat_id, &plain, TextFormat::Plain, rendered.keyboard.as_ref())
                .await
        }
        other => other,
    }
}

/// Edit a message in place, falling back to plain text like [`send_rendered`].
///
/// # Errors
///
/// Returns the messenger error when both attempts fail.
pub async fn edit_rendered(
    messenger: &dyn Messenger,
    chat_id: ChatId,
    message_id: MessageId,
    rendered: &Rendered,
) -> Result<(), DigestError> {
    match messenger
        .edit_message(
            chat_id,
            message_id,
            &rendered.text,
            TextFormat::Html,
            rendered.keyboard.as_ref(),
        )
        .await
    {
        Err(DigestError::RenderRejected(reason)) => {
            warn!(
                "Markup rejected for message {} ({}), editing as plain text",
                message_id, reason
            );
            let plain = html_to_plain_text(&rendered.text);
            messenger
                .edit_message(
                    chat_id,
                    message_id,
                    &plain,
                    TextFormat::Plain,
                    rendered.keyboard.as_ref(),
                )
                .await
        }
        other => other,
    }
}

/// Plain-text message to a user's private chat.
///
/// # Errors
///
/// Returns the messenger error if sending fails.
pub async fn send_private(
    messenger: &dyn Messenger,
    user_id: UserId,
    text: &str,
) -> Result<(), DigestError> {
    messenger
        .send_message(user_id, text, TextFormat::Plain, None)
        .await?;
    info!("Sent private message to user {}", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_keeps_summary_markup_and_links_source() {
        let r = render_success(
            "<b>Title</b>\n<blockquote>Overview</blockquote>",
            "https://example.com/a",
            true,
        );
        assert!(r.text.starts_with("<b>Title</b>\n<blockquote>Overview</blockquote>"));
        assert!(r.text.contains("<a href=\"https://example.com/a\">Source</a>"));
        assert_eq!(r.keyboard, Some(rating_keyboard()));
    }

    #[test]
    fn success_without_tracing_drops_controls() {
        let r = render_success("<b>T</b>", "https://example.com/a", false);
        assert!(r.keyboard.is_none());
        assert!(r.text.contains(TRACING_UNAVAILABLE_NOTICE));
    }

    #[test]
    fn failure_cites_url_and_escapes_reason() {
        let r = render_failure("https://example.com/a?x=1&y=2", "bad <html>");
        assert!(r.text.contains("https://example.com/a?x=1&amp;y=2"));
        assert!(r.text.contains("bad &lt;html&gt;"));
        assert_eq!(r.keyboard, Some(retry_keyboard()));
    }

    #[test]
    fn long_summaries_are_cut_to_budget() {
        let long = "a".repeat(10_000);
        let fitted = fit_summary(&long);
        assert_eq!(fitted.chars().count(), SUMMARY_CHAR_BUDGET + 1);
        assert!(fitted.ends_with('…'));

        let escaped = "<".repeat(5_000);
        assert!(fit_summary(&escaped).chars().count() <= SUMMARY_CHAR_BUDGET + 1);
    }
}
