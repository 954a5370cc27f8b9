use std::env;

use super::models::{ChatId, UserId};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_LANGFUSE_HOST: &str = "https://cloud.langfuse.com";
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Langfuse credentials. Only constructed when both keys are present.
#[derive(Debug, Clone)]
pub struct LangfuseConfig {
    pub public_key: String,
    pub secret_key: String,
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub source_chat_id: ChatId,
    pub dest_chat_id: ChatId,
    pub allowed_user_id: Option<UserId>,
    pub bot_username: Option<String>,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub langfuse: Option<LangfuseConfig>,
    pub max_concurrent_jobs: usize,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that is missing or malformed.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .map_err(|e| format!("TELEGRAM_BOT_TOKEN: {}", e))?,
            source_chat_id: parse_chat_id("SOURCE_CHAT_ID")?,
            dest_chat_id: parse_chat_id("DEST_CHAT_ID")?,
            allowed_user_id: optional_var("ALLOWED_USER_ID")
                .map(|raw| {
                    raw.parse::<UserId>()
                        .map_err(|e| format!("ALLOWED_USER_ID: {}", e))
                })
                .transpose()?,
            bot_username: optional_var("BOT_USERNAME")
                .map(|name| name.trim_start_matches('@').to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .map_err(|e| format!("GEMINI_API_KEY: {}", e))?,
            gemini_model: optional_var("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            langfuse: langfuse_from_parts(
                optional_var("LANGFUSE_PUBLIC_KEY"),
                optional_var("LANGFUSE_SECRET_KEY"),
                optional_var("LANGFUSE_HOST"),
            ),
            max_concurrent_jobs: optional_var("MAX_CONCURRENT_JOBS")
                .map(|raw| {
                    raw.parse::<usize>()
                        .map_err(|e| format!("MAX_CONCURRENT_JOBS: {}", e))
                })
                .transpose()?
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONCURRENT_JOBS),
        })
    }
}

/// Langfuse is all-or-nothing: a partial key pair means no sink at all.
#[must_use]
pub fn langfuse_from_parts(
    public_key: Option<String>,
    secret_key: Option<String>,
    host: Option<String>,
) -> Option<LangfuseConfig> {
    match (public_key, secret_key) {
        (Some(public_key), Some(secret_key)) => Some(LangfuseConfig {
            public_key,
            secret_key,
            host: host
                .map(|h| h.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_LANGFUSE_HOST.to_string()),
        }),
        _ => None,
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_chat_id(name: &str) -> Result<ChatId, String> {
    let raw = env::var(name).map_err(|e| format!("{}: {}", name, e))?;
    raw.trim()
        .parse::<ChatId>()
        .map_err(|e| format!("{} must be an integer (e.g. -100123456789): {}", name, e))
}
