use anyhow::{Context, Result, anyhow};
use linkdigest::DigestBot;
use linkdigest::core::config::AppConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    linkdigest::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        anyhow!(e)
    })?;
    info!(
        "Watching chat {} and posting digests to {}",
        config.source_chat_id, config.dest_chat_id
    );

    let bot = DigestBot::new(&config)
        .await
        .context("Failed to initialize bot")?;
    bot.run().await.context("Poller stopped with an error")?;

    info!("Bye");
    Ok(())
}
