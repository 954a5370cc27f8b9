//! Run extraction and summarization for a single URL and print both.
//!
//! Usage: `digest-probe <URL> [--extract-only]`

use anyhow::{Result, anyhow, bail};
use linkdigest::ai::{GeminiClient, Summarizer};
use linkdigest::extract::{ContentExtractor, HttpExtractor};
use linkdigest::utils::truncate_chars;
use std::env;

const PREVIEW_CHARS: usize = 1500;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    linkdigest::setup_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(url) = args.iter().find(|a| !a.starts_with("--")) else {
        bail!("usage: digest-probe <URL> [--extract-only]");
    };
    let extract_only = args.iter().any(|a| a == "--extract-only");

    let article = HttpExtractor::default()
        .extract(url)
        .await
        .map_err(|e| anyhow!("extraction failed: {e}"))?;
    println!("--- extracted {} chars ---", article.chars().count());
    println!("{}", truncate_chars(&article, PREVIEW_CHARS));

    if extract_only {
        return Ok(());
    }

    let api_key = env::var("GEMINI_API_KEY").map_err(|_| anyhow!("GEMINI_API_KEY not set"))?;
    let model = env::var("GEMINI_MODEL")
        .unwrap_or_else(|_| linkdigest::core::config::DEFAULT_GEMINI_MODEL.to_string());
    let summary = GeminiClient::new(api_key, model)
        .summarize(&article)
        .await
        .map_err(|e| anyhow!("summarization failed: {e}"))?;

    println!("--- summary ({}) ---", summary.model);
    println!("{}", summary.text);
    Ok(())
}
