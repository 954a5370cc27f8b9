//! Wiring of the bot: collaborators, settings and the polling entry point.

use std::sync::Arc;
use tracing::info;

use crate::ai::{GeminiClient, Summarizer};
use crate::api::poller::run_polling;
use crate::api::EventRouter;
use crate::core::config::AppConfig;
use crate::core::models::{ChatId, UserId};
use crate::errors::DigestError;
use crate::extract::{ContentExtractor, HttpExtractor};
use crate::telegram::{Messenger, TelegramClient};
use crate::telemetry::{LangfuseSink, NoopSink, ObservabilitySink};

/// External collaborators shared by the pipeline and the handlers.
#[derive(Clone)]
pub struct Services {
    pub messenger: Arc<dyn Messenger>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
    pub sink: Arc<dyn ObservabilitySink>,
}

/// Runtime settings derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub source_chat_id: ChatId,
    pub dest_chat_id: ChatId,
    pub allowed_user_id: Option<UserId>,
    pub bot_username: String,
    pub max_concurrent_jobs: usize,
}

impl BotSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig, bot_username: String) -> Self {
        Self {
            source_chat_id: config.source_chat_id,
            dest_chat_id: config.dest_chat_id,
            allowed_user_id: config.allowed_user_id,
            bot_username,
            max_concurrent_jobs: config.max_concurrent_jobs,
        }
    }
}

/// Pick the observability sink once: Langfuse when configured, no-op otherwise.
#[must_use]
pub fn select_sink(config: &AppConfig) -> Arc<dyn ObservabilitySink> {
    match &config.langfuse {
        Some(langfuse) => {
            info!("Langfuse tracing enabled ({})", langfuse.host);
            Arc::new(LangfuseSink::new(langfuse.clone()))
        }
        None => {
            info!("Langfuse not configured, tracing disabled");
            Arc::new(NoopSink)
        }
    }
}

pub struct DigestBot {
    client: Arc<TelegramClient>,
    router: Arc<EventRouter>,
    source_chat_id: ChatId,
}

impl DigestBot {
    /// Build the bot from configuration, resolving the bot's username with
    /// `getMe` when it is not configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the username cannot be resolved.
    pub async fn new(config: &AppConfig) -> Result<Self, DigestError> {
        let client = Arc::new(TelegramClient::new(config.telegram_bot_token.clone()));

        let bot_username = match &config.bot_username {
            Some(name) => name.clone(),
            None => {
                let me = client.get_me().await?;
                me.username.ok_or_else(|| {
                    DigestError::ConfigError("bot account has no username".to_string())
                })?
            }
        };
        info!("Running as @{}", bot_username);

        let services = Services {
            messenger: client.clone(),
            extractor: Arc::new(HttpExtractor::default()),
            summarizer: Arc::new(GeminiClient::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            )),
            sink: select_sink(config),
        };
        let settings = BotSettings::from_config(config, bot_username);

        Ok(Self {
            client,
            router: Arc::new(EventRouter::new(services, &settings)),
            source_chat_id: settings.source_chat_id,
        })
    }

    /// Long-poll until interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown signal cannot be installed.
    pub async fn run(self) -> Result<(), DigestError> {
        run_polling(self.client, self.router, self.source_chat_id).await
    }
}
