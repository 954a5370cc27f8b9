//! Telegram Bot API client module
//!
//! Encapsulates all Bot API interactions with retry logic and error handling.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use super::messenger::Messenger;
use super::types::{ApiResponse, InlineKeyboard, PressAnswer, TextFormat, Update, User};
use crate::core::models::{ChatId, MessageId};
use crate::errors::DigestError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const MAX_RETRY_AFTER_SECS: u64 = 30;
const ERROR_NOT_MODIFIED: &str = "message is not modified";
const ERROR_CANT_PARSE: &str = "can't parse entities";

/// Seconds a `getUpdates` call is held open by Telegram.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

pub const ALLOWED_UPDATES: &[&str] = &["message", "channel_post", "callback_query"];

/// Failure of a single Bot API call, split by whether repeating it can help.
#[derive(Debug)]
enum CallError {
    Transient(DigestError),
    Fatal(DigestError),
}

impl CallError {
    fn is_transient(&self) -> bool {
        matches!(self, CallError::Transient(_))
    }

    fn into_inner(self) -> DigestError {
        match self {
            CallError::Transient(e) | CallError::Fatal(e) => e,
        }
    }
}

fn classify_failure(method: &str, code: u16, description: &str) -> CallError {
    if description.to_ascii_lowercase().contains(ERROR_CANT_PARSE) {
        return CallError::Fatal(DigestError::RenderRejected(description.to_string()));
    }
    let err = DigestError::TelegramError(format!("{method} error ({code}): {description}"));
    if code >= 500 {
        CallError::Transient(err)
    } else {
        CallError::Fatal(err)
    }
}

/// Whether an edit failed only because the content was already current.
#[must_use]
pub fn is_not_modified(err: &DigestError) -> bool {
    matches!(err, DigestError::TelegramError(msg) if msg.contains(ERROR_NOT_MODIFIED))
}

fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Html => Some("HTML"),
        TextFormat::Plain => None,
    }
}

fn keyboard_value(keyboard: Option<&InlineKeyboard>) -> Value {
    keyboard.map_or_else(
        || json!({ "inline_keyboard": [] }),
        |k| serde_json::to_value(k).unwrap_or_else(|_| json!({ "inline_keyboard": [] })),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload builders (extracted for testability)
// ─────────────────────────────────────────────────────────────────────────────

/// Build the JSON payload for `sendMessage`.
#[must_use]
pub fn build_send_payload(
    chat_id: ChatId,
    text: &str,
    format: TextFormat,
    keyboard: Option<&InlineKeyboard>,
) -> Value {
    let mut payload = json!({
        "chat_id": chat_id,
        "text": text,
        "link_preview_options": { "is_disabled": true },
    });

    if let Some(mode) = parse_mode(format) {
        payload["parse_mode"] = Value::String(mode.to_string());
    }

    if keyboard.is_some() {
        payload["reply_markup"] = keyboard_value(keyboard);
    }

    payload
}

/// Build the JSON payload for `editMessageText`. A missing keyboard removes
/// any controls the message had.
#[must_use]
pub fn build_edit_payload(
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
    format: TextFormat,
    keyboard: Option<&InlineKeyboard>,
) -> Value {
    let mut payload = json!({
        "chat_id": chat_id,
        "message_id": message_id,
        "text": text,
        "link_preview_options": { "is_disabled": true },
        "reply_markup": keyboard_value(keyboard),
    });

    if let Some(mode) = parse_mode(format) {
        payload["parse_mode"] = Value::String(mode.to_string());
    }

    payload
}

/// Build the JSON payload for `answerCallbackQuery`.
#[must_use]
pub fn build_answer_payload(press_id: &str, answer: &PressAnswer) -> Value {
    let mut payload = json!({ "callback_query_id": press_id });

    if let Some(text) = &answer.text {
        payload["text"] = Value::String(text.clone());
    }
    if let Some(url) = &answer.url {
        payload["url"] = Value::String(url.clone());
    }

    payload
}

/// Telegram Bot API client with retry logic and error handling
pub struct TelegramClient {
    http: Client,
    token: String,
    api_base: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, TELEGRAM_API_BASE.to_string())
    }

    #[must_use]
    pub fn with_api_base(token: String, api_base: String) -> Self {
        // Must outlive the long-poll window of getUpdates.
        let http = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS + 35))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, CallError> {
        let resp = self
            .http
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                CallError::Transient(DigestError::HttpError(format!(
                    "{method} request failed: {}",
                    e.without_url()
                )))
            })?;

        let status = resp.status();
        let body: ApiResponse<T> = resp.json().await.map_err(|e| {
            let err = DigestError::TelegramError(format!(
                "{method} HTTP {status}: unreadable response: {}",
                e.without_url()
            ));
            if status.is_server_error() {
                CallError::Transient(err)
            } else {
                CallError::Fatal(err)
            }
        })?;

        if body.ok {
            return body.result.ok_or_else(|| {
                CallError::Fatal(DigestError::TelegramError(format!(
                    "{method} returned no result"
                )))
            });
        }

        let code = body.error_code.unwrap_or_else(|| status.as_u16());
        let description = body
            .description
            .unwrap_or_else(|| "unknown error".to_string());

        if code == 429 {
            let wait = body
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(1)
                .min(MAX_RETRY_AFTER_SECS);
            warn!("Telegram rate limit on {}, waiting {}s", method, wait);
            tokio::time::sleep(Duration::from_secs(wait)).await;
            return Err(CallError::Transient(DigestError::TelegramError(format!(
                "{method} rate limited: {description}"
            ))));
        }

        Err(classify_failure(method, code, &description))
    }

    /// Single attempt. Used for calls that must not be repeated blindly.
    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T, DigestError> {
        self.call_once(method, payload)
            .await
            .map_err(CallError::into_inner)
    }

    /// Retry transient failures with exponential backoff. Only for idempotent calls.
    async fn call_with_retry<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, DigestError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(100)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(4);

        RetryIf::spawn(
            strategy,
            || self.call_once::<T>(method, payload),
            CallError::is_transient,
        )
        .await
        .map_err(CallError::into_inner)
    }

    /// # Errors
    ///
    /// Returns an error if the Bot API call fails.
    pub async fn get_me(&self) -> Result<User, DigestError> {
        self.call_with_retry("getMe", &json!({})).await
    }

    /// Long-poll for updates after `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Bot API call fails after retries.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, DigestError> {
        let mut payload = json!({
            "timeout": LONG_POLL_TIMEOUT_SECS,
            "allowed_updates": ALLOWED_UPDATES,
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        self.call_with_retry("getUpdates", &payload).await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    // sendMessage is not retried: a timed-out request may still have been delivered.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, DigestError> {
        let payload = build_send_payload(chat_id, text, format, keyboard);
        let sent: super::types::Message = self.call("sendMessage", &payload).await?;
        debug!(chat_id, message_id = sent.message_id, "Sent message");
        Ok(sent.message_id)
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), DigestError> {
        let payload = build_edit_payload(chat_id, message_id, text, format, keyboard);
        match self.call_with_retry::<Value>("editMessageText", &payload).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn edit_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), DigestError> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "reply_markup": keyboard_value(keyboard),
        });
        match self
            .call_with_retry::<Value>("editMessageReplyMarkup", &payload)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn answer_press(&self, press_id: &str, answer: &PressAnswer) -> Result<(), DigestError> {
        let payload = build_answer_payload(press_id, answer);
        self.call::<bool>("answerCallbackQuery", &payload)
            .await
            .map(|_| ())
    }
}
