use regex::Regex;
use url::Url;

static RAW_URL_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s<>"']+"#)
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

/// Return the first well-formed `http(s)` URL in a post body, by position.
///
/// Trailing sentence punctuation is dropped, fragments are kept. Candidates
/// that do not parse into a URL with a host are skipped.
#[must_use]
pub fn extract_first_url(text: &str) -> Option<String> {
    RAW_URL_RE
        .find_iter(text)
        .map(|m| trim_trailing_punctuation(m.as_str()))
        .find(|candidate| is_well_formed(candidate))
        .map(ToString::to_string)
}

#[must_use]
fn is_well_formed(candidate: &str) -> bool {
    Url::parse(candidate)
        .ok()
        .is_some_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty()))
}

#[must_use]
fn trim_trailing_punctuation(s: &str) -> &str {
    let mut out = s.trim_end_matches(&['.', ',', ';', ':', '!', '?', ']', '}'][..]);
    // Keep a closing paren that balances one inside the URL (wiki-style links).
    while out.ends_with(')') && out.matches(')').count() > out.matches('(').count() {
        out = out[..out.len() - 1].trim_end_matches(&['.', ',', ';', ':', '!', '?'][..]);
    }
    out
}
