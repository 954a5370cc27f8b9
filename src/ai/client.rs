//! Gemini API client module
//!
//! Encapsulates the summarization call against the Gemini REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::prompt::build_summary_prompt;
use crate::errors::DigestError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A successful summarization, with the exact prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutput {
    pub text: String,
    pub prompt: String,
    pub model: String,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize article text. Errors carry a user-facing reason.
    async fn summarize(&self, article: &str) -> Result<SummaryOutput, DigestError>;
}

/// Map a Gemini API failure to the message shown next to the retry button.
#[must_use]
pub fn format_gemini_error(status: u16, message: &str) -> String {
    let lowered = message.to_ascii_lowercase();
    if status >= 500 {
        if status == 503 || lowered.contains("overloaded") {
            return "The Gemini model is currently overloaded. Please retry in a moment."
                .to_string();
        }
        return format!("Gemini server error ({status}): {message}");
    }
    if status == 429 || lowered.contains("quota") || lowered.contains("rate") {
        return "Gemini API quota or rate limit exceeded. Please try again later.".to_string();
    }
    format!("Gemini client error ({status}): {message}")
}

/// Models like to wrap HTML answers in a fenced code block; drop the fence.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    match body.split_once('\n') {
        Some((lang, inner)) if !lang.contains(' ') => inner.trim(),
        _ => body.trim(),
    }
}

fn extract_text(response_json: &Value) -> Option<String> {
    let parts = response_json
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let collected: Vec<&str> = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    let joined = collected.join("");
    let text = strip_code_fence(&joined);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiClient {
    #[must_use]
    pub fn new(api_key: String, model_name: String) -> Self {
        Self::with_base_url(api_key, model_name, GEMINI_API_BASE.to_string())
    }

    #[must_use]
    pub fn with_base_url(api_key: String, model_name: String, base_url: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            api_key,
            model_name,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send a raw prompt and return the model's text.
    ///
    /// # Errors
    ///
    /// Returns `DigestError::SummarizationFailed` with a user-facing message
    /// when the request fails, the API answers with an error, or the answer
    /// holds no text.
    pub async fn generate(&self, prompt: &str) -> Result<String, DigestError> {
        #[cfg(feature = "debug-logs")]
        info!("Using Gemini prompt:\n{}", prompt);

        #[cfg(not(feature = "debug-logs"))]
        info!(
            "Generating summary with {} ({} prompt chars)",
            self.model_name,
            prompt.chars().count()
        );

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model_name
        );
        let request_body = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": { "temperature": 0.3 }
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| DigestError::SummarizationFailed(format!("Unexpected error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            let message = serde_json::from_str::<Value>(&error_text)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                })
                .unwrap_or(error_text);
            debug!("Gemini API error (status {}): {}", status, message);
            return Err(DigestError::SummarizationFailed(format_gemini_error(
                status.as_u16(),
                &message,
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            DigestError::SummarizationFailed(format!("Failed to parse Gemini response: {e}"))
        })?;

        extract_text(&response_json).ok_or_else(|| {
            let reason = response_json
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(Value::as_str)
                .map_or_else(
                    || "Gemini returned an empty response.".to_string(),
                    |r| format!("Gemini blocked the request ({r})."),
                );
            DigestError::SummarizationFailed(reason)
        })
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, article: &str) -> Result<SummaryOutput, DigestError> {
        let prompt = build_summary_prompt(article);
        let text = self.generate(&prompt).await?;
        Ok(SummaryOutput {
            text,
            prompt,
            model: self.model_name.clone(),
        })
    }
}
