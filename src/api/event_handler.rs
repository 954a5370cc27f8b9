//! Handler for posts in the source chat.

use tracing::{debug, info};

use crate::core::models::{InboundPost, WorkStatus};
use crate::errors::DigestError;
use crate::worker::Pipeline;

/// Accept a post and drive it to a terminal rendering. Returns `None` when
/// the post was skipped (not allow-listed, no link, redelivered).
///
/// # Errors
///
/// Returns an error when the placeholder cannot be sent or the unit vanishes.
#[tracing::instrument(level = "info", skip(pipeline, post), fields(chat = post.chat_id, message = post.message_id))]
pub async fn handle_post(
    pipeline: &Pipeline,
    post: &InboundPost,
) -> Result<Option<WorkStatus>, DigestError> {
    let id = match pipeline.accept_post(post).await {
        Ok(id) => id,
        Err(e) if e.is_silent() => {
            debug!("Skipping post {}: {}", post.message_id, e);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let status = pipeline.run(id).await?;
    info!("Post {} rendered as {:?} in message {}", post.message_id, status, id);
    Ok(Some(status))
}
