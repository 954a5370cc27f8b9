//! All AI/LLM functionality

pub mod client;
pub mod prompt;

// Re-export main types for convenience
pub use client::{GeminiClient, Summarizer, SummaryOutput};
pub use prompt::{MAX_ARTICLE_CHARS, build_summary_prompt};
