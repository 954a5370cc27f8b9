//! Per-post processing: placeholder, extraction, summarization, terminal edit.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::deliver::{
    edit_rendered, render_failure, render_placeholder, render_retrying, render_success,
    send_rendered,
};
use crate::ai::MAX_ARTICLE_CHARS;
use crate::bot::Services;
use crate::core::models::{ChatId, InboundPost, MessageId, WorkStatus, WorkUnit};
use crate::core::{Access, AccessFilter, WorkUnitStore};
use crate::errors::DigestError;
use crate::telemetry::GenerationRecord;
use crate::utils::{extract_first_url, truncate_chars};

/// Reason text shown next to the retry button.
#[must_use]
pub fn failure_reason(err: &DigestError) -> String {
    match err {
        DigestError::ExtractionFailed(reason) | DigestError::SummarizationFailed(reason) => {
            reason.clone()
        }
        other => other.to_string(),
    }
}

pub struct Pipeline {
    services: Services,
    store: Arc<WorkUnitStore>,
    access: AccessFilter,
    dest_chat_id: ChatId,
    permits: Semaphore,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        services: Services,
        store: Arc<WorkUnitStore>,
        access: AccessFilter,
        dest_chat_id: ChatId,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            services,
            store,
            access,
            dest_chat_id,
            permits: Semaphore::new(max_concurrent_jobs.max(1)),
        }
    }

    #[must_use]
    pub fn dest_chat_id(&self) -> ChatId {
        self.dest_chat_id
    }

    /// Gate a source post and, if it carries a link, post the placeholder and
    /// start tracking a pending work unit keyed by the placeholder's id.
    ///
    /// # Errors
    ///
    /// `AccessDenied`, `NoLinkFound` and `DuplicatePost` when the post is
    /// skipped; messenger errors when the placeholder cannot be sent.
    pub async fn accept_post(&self, post: &InboundPost) -> Result<MessageId, DigestError> {
        if self.access.check(post.author_id) == Access::Deny {
            info!(
                "Ignoring post {} from user {:?}: not allow-listed",
                post.message_id, post.author_id
            );
            return Err(DigestError::AccessDenied);
        }

        let url = extract_first_url(&post.text).ok_or(DigestError::NoLinkFound)?;

        if !self.store.claim_source(post.chat_id, post.message_id) {
            debug!("Post {} already processed, skipping", post.message_id);
            return Err(DigestError::DuplicatePost);
        }

        let id = send_rendered(
            self.services.messenger.as_ref(),
            self.dest_chat_id,
            &render_placeholder(&url),
        )
        .await?;
        self.store.insert(WorkUnit::pending(id, url.clone()))?;
        info!("Accepted {} as work unit {}", url, id);
        Ok(id)
    }

    /// Drive a pending unit to its terminal state. Extraction and
    /// summarization failures are rendered on the message, not returned.
    ///
    /// # Errors
    ///
    /// `UnknownWorkUnit` when `id` is not tracked.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn run(&self, id: MessageId) -> Result<WorkStatus, DigestError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| DigestError::GeneralError(format!("job queue closed: {e}")))?;

        let url = self
            .store
            .snapshot(id)
            .ok_or(DigestError::UnknownWorkUnit(id))?
            .source_url;

        let article = match self.services.extractor.extract(&url).await {
            Ok(text) => text,
            Err(e) => return Ok(self.finish_failed(id, &url, &e).await),
        };
        self.store
            .update(id, |unit| unit.scraped_text = Some(article.clone()))?;

        let input = truncate_chars(&article, MAX_ARTICLE_CHARS);
        let started_at = Utc::now();
        let output = match self.services.summarizer.summarize(input).await {
            Ok(output) => output,
            Err(e) => return Ok(self.finish_failed(id, &url, &e).await),
        };

        let record = GenerationRecord {
            url: url.clone(),
            model: output.model.clone(),
            prompt: output.prompt.clone(),
            output: output.text.clone(),
            article_chars: input.chars().count(),
            started_at,
            finished_at: Utc::now(),
        };
        let (trace_ref, tracing_ok) = match self.services.sink.record_generation(&record).await {
            Ok(trace_ref) => (trace_ref, true),
            Err(e) => {
                warn!("Tracing failed for work unit {}: {}", id, e);
                (None, false)
            }
        };

        self.store.update(id, |unit| unit.succeed(trace_ref))?;
        let rendered = render_success(&output.text, &url, tracing_ok);
        if let Err(e) = edit_rendered(
            self.services.messenger.as_ref(),
            self.dest_chat_id,
            id,
            &rendered,
        )
        .await
        {
            error!("Failed to display summary for work unit {}: {}", id, e);
            let display_error =
                DigestError::GeneralError("Could not display the summary.".to_string());
            return Ok(self.finish_failed(id, &url, &display_error).await);
        }

        info!("Work unit {} succeeded", id);
        Ok(WorkStatus::Succeeded)
    }

    /// Re-run a unit that was already flipped back to pending: show the
    /// retry notice on the same message, then run again.
    ///
    /// # Errors
    ///
    /// `UnknownWorkUnit` when `id` is not tracked.
    pub async fn retry(&self, id: MessageId) -> Result<WorkStatus, DigestError> {
        let url = self
            .store
            .snapshot(id)
            .ok_or(DigestError::UnknownWorkUnit(id))?
            .source_url;

        if let Err(e) = edit_rendered(
            self.services.messenger.as_ref(),
            self.dest_chat_id,
            id,
            &render_retrying(&url),
        )
        .await
        {
            warn!("Failed to show retry notice on {}: {}", id, e);
        }

        self.run(id).await
    }

    async fn finish_failed(&self, id: MessageId, url: &str, err: &DigestError) -> WorkStatus {
        let reason = failure_reason(err);
        warn!("Work unit {} failed: {}", id, reason);

        if let Err(e) = self.store.update(id, |unit| unit.fail(reason.clone())) {
            error!("Failed to record failure for {}: {}", id, e);
        }
        if let Err(e) = edit_rendered(
            self.services.messenger.as_ref(),
            self.dest_chat_id,
            id,
            &render_failure(url, &reason),
        )
        .await
        {
            error!("Failed to display failure for work unit {}: {}", id, e);
        }
        WorkStatus::Failed
    }
}
