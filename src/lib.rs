//! linkdigest - A Telegram bot that summarizes links posted in a channel using Gemini.
//!
//! Every link posted in the source chat gets a placeholder message in the
//! destination chat, which is then edited into either the article summary
//! (with 👍/👎 rating controls) or an error with a retry button. Ratings and
//! free-text notes are forwarded to Langfuse when it is configured.
//!
//! # Architecture
//!
//! The system uses:
//! - A single long-polling loop over the Telegram Bot API, one task per update
//! - An in-memory work unit store with per-entry locking
//! - reqwest + scraper + html2text for article extraction
//! - The Gemini REST API for summarization
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use linkdigest::DigestBot;
//! use linkdigest::core::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Set up structured logging
//!     linkdigest::setup_logging();
//!
//!     let config = AppConfig {
//!         telegram_bot_token: "dummy_token".to_string(),
//!         source_chat_id: -1001,
//!         dest_chat_id: -1002,
//!         allowed_user_id: None,
//!         bot_username: Some("digest_bot".to_string()),
//!         gemini_api_key: "dummy_gemini_key".to_string(),
//!         gemini_model: "gemini-3-flash-preview".to_string(),
//!         langfuse: None,
//!         max_concurrent_jobs: 4,
//!     };
//!
//!     let bot = DigestBot::new(&config).await?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod ai;
pub mod api;
pub mod bot;
pub mod core;
pub mod errors;
pub mod extract;
pub mod telegram;
pub mod telemetry;
pub mod utils;
pub mod worker;

pub use bot::{BotSettings, DigestBot, Services};
pub use errors::DigestError;

/// Configure structured logging with JSON output.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Call once at
/// process start.
///
/// # Example
///
/// ```
/// linkdigest::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    // try_init: a second call (tests, probe after bot) must not panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
