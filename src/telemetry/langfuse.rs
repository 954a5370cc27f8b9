//! Langfuse ingestion client
//!
//! Uses the public batch ingestion endpoint with basic auth. The endpoint
//! answers `207 Multi-Status` and lists per-event failures in `errors`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{COMMENT_SCORE, GenerationRecord, ObservabilitySink, RATING_SCORE};
use crate::core::config::LangfuseConfig;
use crate::core::models::TraceRef;
use crate::errors::DigestError;

const TRACE_NAME: &str = "summarize-article";
const GENERATION_NAME: &str = "summary";

pub struct LangfuseSink {
    http: Client,
    config: LangfuseConfig,
}

impl LangfuseSink {
    #[must_use]
    pub fn new(config: LangfuseConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, config }
    }

    fn ingestion_url(&self) -> String {
        format!("{}/api/public/ingestion", self.config.host)
    }

    async fn ingest(&self, batch: Vec<Value>) -> Result<(), DigestError> {
        let resp = self
            .http
            .post(self.ingestion_url())
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
            .json(&json!({ "batch": batch }))
            .send()
            .await
            .map_err(|e| DigestError::TracingFailed(format!("ingestion request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DigestError::TracingFailed(format!(
                "ingestion HTTP {status}: {body}"
            )));
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        match body.get("errors").and_then(Value::as_array) {
            Some(errors) if !errors.is_empty() => {
                warn!("Langfuse rejected {} event(s): {}", errors.len(), body);
                Err(DigestError::TracingFailed(format!(
                    "ingestion rejected {} event(s)",
                    errors.len()
                )))
            }
            _ => Ok(()),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn event(kind: &str, body: Value) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "timestamp": timestamp(Utc::now()),
        "type": kind,
        "body": body,
    })
}

/// Build the trace + generation events for one attempt.
#[must_use]
pub fn generation_batch(trace_id: &str, record: &GenerationRecord) -> Vec<Value> {
    let metadata = json!({
        "url": record.url,
        "article_chars": record.article_chars,
        "latency_ms": record.latency_ms(),
    });

    vec![
        event(
            "trace-create",
            json!({
                "id": trace_id,
                "name": TRACE_NAME,
                "timestamp": timestamp(record.started_at),
                "input": { "url": record.url },
                "output": record.output,
                "metadata": metadata,
            }),
        ),
        event(
            "generation-create",
            json!({
                "id": Uuid::new_v4().to_string(),
                "traceId": trace_id,
                "name": GENERATION_NAME,
                "model": record.model,
                "input": record.prompt,
                "output": record.output,
                "startTime": timestamp(record.started_at),
                "endTime": timestamp(record.finished_at),
                "metadata": metadata,
            }),
        ),
    ]
}

#[must_use]
pub fn rating_event(trace: &TraceRef, positive: bool) -> Value {
    event(
        "score-create",
        json!({
            "id": Uuid::new_v4().to_string(),
            "traceId": trace.as_str(),
            "name": RATING_SCORE,
            "value": if positive { 1 } else { 0 },
            "dataType": "NUMERIC",
        }),
    )
}

#[must_use]
pub fn comment_event(trace: &TraceRef, comment: &str) -> Value {
    event(
        "score-create",
        json!({
            "id": Uuid::new_v4().to_string(),
            "traceId": trace.as_str(),
            "name": COMMENT_SCORE,
            "value": comment,
            "comment": comment,
            "dataType": "CATEGORICAL",
        }),
    )
}

#[async_trait]
impl ObservabilitySink for LangfuseSink {
    async fn record_generation(
        &self,
        record: &GenerationRecord,
    ) -> Result<Option<TraceRef>, DigestError> {
        let trace_id = Uuid::new_v4().to_string();
        self.ingest(generation_batch(&trace_id, record)).await?;
        debug!(trace_id = %trace_id, url = %record.url, "Recorded generation");
        Ok(Some(TraceRef(trace_id)))
    }

    async fn score_rating(&self, trace: &TraceRef, positive: bool) -> Result<(), DigestError> {
        self.ingest(vec![rating_event(trace, positive)]).await
    }

    async fn score_comment(&self, trace: &TraceRef, comment: &str) -> Result<(), DigestError> {
        self.ingest(vec![comment_event(trace, comment)]).await
    }
}
