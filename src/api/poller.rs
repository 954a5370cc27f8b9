//! Long-polling loop over `getUpdates`.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::handler::EventRouter;
use super::parsing::classify_update;
use crate::core::models::ChatId;
use crate::errors::DigestError;
use crate::telegram::TelegramClient;

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Spawn one task per event so slow pipelines never hold up polling.
pub fn spawn_dispatch(router: &Arc<EventRouter>, event: crate::core::models::InboundEvent) {
    let router = Arc::clone(router);
    tokio::spawn(async move {
        match router.dispatch(event).await {
            Ok(()) => {}
            Err(e) if e.is_silent() => debug!("Event skipped: {}", e),
            Err(e) => error!("Event handling failed: {}", e),
        }
    });
}

/// Poll until Ctrl-C. Errors from individual events are logged, never fatal.
///
/// # Errors
///
/// Returns an error if the shutdown signal handler cannot be installed.
pub async fn run_polling(
    client: Arc<TelegramClient>,
    router: Arc<EventRouter>,
    source_chat_id: ChatId,
) -> Result<(), DigestError> {
    let mut offset: Option<i64> = None;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    info!("Polling for updates");

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal.map_err(|e| DigestError::GeneralError(format!("signal handler failed: {e}")))?;
                info!("Shutdown requested, stopping poller");
                return Ok(());
            }
            batch = client.get_updates(offset) => match batch {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        match classify_update(&update, source_chat_id) {
                            Some(event) => spawn_dispatch(&router, event),
                            None => debug!("Ignoring update {}", update.update_id),
                        }
                    }
                }
                Err(e) => {
                    error!("getUpdates failed: {}", e);
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                }
            }
        }
    }
}
