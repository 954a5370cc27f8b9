//! Article text extraction.
//!
//! Fetches a page and reduces it to readable text: the first `<article>`,
//! then `<main>`, then `<body>` wins, and the chosen subtree is rendered to
//! plain text with `html2text`.

use async_trait::async_trait;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::DigestError;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
const ALLOWED_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];
const CONTENT_SELECTORS: &[&str] = &["article", "main", "[role=main]", "body"];
const TEXT_WIDTH: usize = 200;

/// Below this many characters a page is treated as having no article.
pub const MIN_CONTENT_CHARS: usize = 200;

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Return the readable text behind `url`, or `DigestError::ExtractionFailed`.
    async fn extract(&self, url: &str) -> Result<String, DigestError>;
}

#[derive(Debug, Clone)]
pub struct ExtractSettings {
    pub request_timeout: Duration,
    pub max_bytes: usize,
    pub min_chars: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_bytes: 5 * 1024 * 1024,
            min_chars: MIN_CONTENT_CHARS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpExtractor {
    http: Client,
    settings: ExtractSettings,
}

impl Default for HttpExtractor {
    fn default() -> Self {
        Self::new(ExtractSettings::default())
    }
}

impl HttpExtractor {
    #[must_use]
    pub fn new(settings: ExtractSettings) -> Self {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, settings }
    }

    async fn fetch_html(&self, url: &str) -> Result<String, DigestError> {
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| DigestError::ExtractionFailed(format!("could not download page: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DigestError::ExtractionFailed(format!(
                "page answered with HTTP {status}"
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !is_content_type_allowed(&content_type) {
            return Err(DigestError::ExtractionFailed(format!(
                "unsupported content type {content_type}"
            )));
        }

        if let Some(len) = resp.content_length() {
            if len > self.settings.max_bytes as u64 {
                return Err(self.too_large());
            }
        }

        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| DigestError::ExtractionFailed(format!("could not read page: {e}")))?;
            if bytes.len() + chunk.len() > self.settings.max_bytes {
                return Err(self.too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(decode_html(&bytes, Some(&content_type)))
    }

    fn too_large(&self) -> DigestError {
        DigestError::ExtractionFailed(format!(
            "page is larger than {} bytes",
            self.settings.max_bytes
        ))
    }
}

/// Decode a page body to UTF-8: byte order mark, then the `Content-Type`
/// charset, then detection. Undecodable sequences become U+FFFD.
#[must_use]
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(enc, _)| enc)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!("Page had bytes invalid in {}", encoding.name());
    }
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']))
    })
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    #[tracing::instrument(level = "info", skip(self))]
    async fn extract(&self, url: &str) -> Result<String, DigestError> {
        let html = self.fetch_html(url).await?;
        debug!("Downloaded {} bytes of HTML", html.len());

        let text = extract_article_text(&html)?;
        let chars = text.chars().count();
        if chars < self.settings.min_chars {
            return Err(DigestError::ExtractionFailed(
                "no extractable content".to_string(),
            ));
        }

        info!("Extracted {} characters", chars);
        Ok(text)
    }
}

fn is_content_type_allowed(content_type: &str) -> bool {
    let ct = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ct))
}

/// Pick the most article-like subtree and render it as plain text.
///
/// # Errors
///
/// Returns `DigestError::ExtractionFailed` when the HTML cannot be rendered.
pub fn extract_article_text(html: &str) -> Result<String, DigestError> {
    let doc = Html::parse_document(html);

    let fragment = CONTENT_SELECTORS
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|sel| {
            doc.select(&sel)
                .map(|node| node.html())
                .find(|inner| has_visible_text(inner))
        })
        .unwrap_or_else(|| doc.root_element().html());

    let text = html2text::from_read(fragment.as_bytes(), TEXT_WIDTH)
        .map_err(|e| DigestError::ExtractionFailed(format!("could not render page text: {e}")))?;

    Ok(collapse_blank_lines(&text))
}

fn has_visible_text(fragment: &str) -> bool {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .any(|t| !t.trim().is_empty())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
