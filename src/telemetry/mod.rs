//! Observability sink for summarization attempts and user feedback.
//!
//! The sink is chosen once at startup: [`LangfuseSink`] when credentials are
//! configured, [`NoopSink`] otherwise. Callers always go through the trait.

pub mod langfuse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::models::TraceRef;
use crate::errors::DigestError;

pub use langfuse::LangfuseSink;

/// Score names shared with the offline trace tooling.
pub const RATING_SCORE: &str = "user_rating";
pub const COMMENT_SCORE: &str = "user_comment";

/// One summarization attempt as reported to the sink.
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub url: String,
    pub model: String,
    pub prompt: String,
    pub output: String,
    pub article_chars: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl GenerationRecord {
    #[must_use]
    pub fn latency_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[async_trait]
pub trait ObservabilitySink: Send + Sync {
    /// Record an attempt. `Ok(None)` means the sink does not hand out trace
    /// references (nothing to score later).
    async fn record_generation(
        &self,
        record: &GenerationRecord,
    ) -> Result<Option<TraceRef>, DigestError>;

    async fn score_rating(&self, trace: &TraceRef, positive: bool) -> Result<(), DigestError>;

    async fn score_comment(&self, trace: &TraceRef, comment: &str) -> Result<(), DigestError>;
}

/// Sink used when observability is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl ObservabilitySink for NoopSink {
    async fn record_generation(
        &self,
        _record: &GenerationRecord,
    ) -> Result<Option<TraceRef>, DigestError> {
        Ok(None)
    }

    async fn score_rating(&self, _trace: &TraceRef, _positive: bool) -> Result<(), DigestError> {
        Ok(())
    }

    async fn score_comment(&self, _trace: &TraceRef, _comment: &str) -> Result<(), DigestError> {
        Ok(())
    }
}
