use thiserror::Error;

use crate::core::models::MessageId;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Failed to parse Telegram update: {0}")]
    ParseError(String),

    #[error("Failed to access Telegram API: {0}")]
    TelegramError(String),

    #[error("Failed to access Gemini API: {0}")]
    LlmError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),

    #[error("Post author is not allow-listed")]
    AccessDenied,

    #[error("No link found in post")]
    NoLinkFound,

    #[error("Post was already processed")]
    DuplicatePost,

    #[error("Could not extract content: {0}")]
    ExtractionFailed(String),

    #[error("Could not summarize content: {0}")]
    SummarizationFailed(String),

    #[error("Observability sink failed: {0}")]
    TracingFailed(String),

    #[error("Unknown work unit for message {0}")]
    UnknownWorkUnit(MessageId),

    #[error("Telegram rejected message markup: {0}")]
    RenderRejected(String),
}

impl DigestError {
    /// Outcomes that are expected and must not surface anywhere except debug logs.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            DigestError::AccessDenied | DigestError::NoLinkFound | DigestError::DuplicatePost
        )
    }
}

impl From<reqwest::Error> for DigestError {
    fn from(error: reqwest::Error) -> Self {
        DigestError::HttpError(error.to_string())
    }
}

impl From<anyhow::Error> for DigestError {
    fn from(error: anyhow::Error) -> Self {
        DigestError::GeneralError(error.to_string())
    }
}
