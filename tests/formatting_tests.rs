use linkdigest::utils::extract_first_url;
use linkdigest::utils::html::{html_to_plain_text, sanitize_telegram_html};
use linkdigest::worker::deliver::{render_placeholder, render_success};

/// Tests for the message formatting logic

#[test]
fn test_summary_markup_survives_sanitizing() {
    let summary = "<b>Title</b>\n<blockquote>Overview</blockquote>\n• <i>point</i> with <code>code</code>";
    assert_eq!(sanitize_telegram_html(summary), summary);
}

#[test]
fn test_model_markup_outside_subset_is_neutralized() {
    let out = sanitize_telegram_html("<h2>Heading</h2><ul><li>one</li></ul><b>bold");
    assert!(out.starts_with("&lt;h2&gt;Heading&lt;/h2&gt;"));
    assert!(out.ends_with("<b>bold</b>"));
}

#[test]
fn test_disallowed_links_lose_their_tag() {
    let out = sanitize_telegram_html("<a href=\"javascript:alert(1)\">x</a> <a href=\"https://ok.example\">y</a>");
    assert!(!out.contains("<a href=\"javascript"));
    assert!(out.contains("&lt;a href="));
    assert!(out.contains("<a href=\"https://ok.example\">y</a>"));
}

#[test]
fn test_plain_text_fallback_keeps_source_link() {
    let rendered = render_success("<b>A &amp; B</b>", "https://example.com/a?x=1&y=2", true);
    assert_eq!(
        html_to_plain_text(&rendered.text),
        "A & B\n\n🔗 Source (https://example.com/a?x=1&y=2)"
    );
}

#[test]
fn test_placeholder_mentions_url() {
    let rendered = render_placeholder("https://example.com/a");
    assert!(rendered.text.contains("https://example.com/a"));
    assert!(rendered.keyboard.is_none());
}

#[test]
fn test_url_extraction_edges() {
    assert_eq!(
        extract_first_url("see (https://example.com/wiki/Foo_(bar)).").as_deref(),
        Some("https://example.com/wiki/Foo_(bar)")
    );
    assert_eq!(
        extract_first_url("https://example.com/a#section!").as_deref(),
        Some("https://example.com/a#section")
    );
    assert_eq!(extract_first_url("ftp://example.com/file"), None);
    assert_eq!(extract_first_url("http:// nothing"), None);
}
