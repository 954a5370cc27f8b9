//! Telegram HTML subset handling.
//!
//! Telegram accepts a small set of inline tags and rejects the whole message
//! on anything else, so model output is rewritten against that set before it
//! is rendered.

use regex::Regex;

const ALLOWED_TAGS: &[&str] = &[
    "b",
    "strong",
    "i",
    "em",
    "u",
    "ins",
    "s",
    "strike",
    "del",
    "a",
    "code",
    "pre",
    "blockquote",
    "tg-spoiler",
    "span",
];

static TAG_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)([^<>]*)>")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static HREF_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static CLASS_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"(?i)class\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static ANCHOR_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?is)<a(\s[^<>]*)?>(.*?)</a\s*>")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static ENTITY_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^&(?:lt|gt|amp|quot|#[0-9]{1,7}|#x[0-9a-fA-F]{1,6});")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

/// Escape text for inclusion in a Telegram HTML message.
#[must_use]
pub fn escape_html(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Rewrite arbitrary HTML-ish text into the Telegram subset.
///
/// Allowed tags are kept (with only the attributes Telegram understands),
/// `<br>` becomes a newline, any other tag is escaped so it shows up as
/// literal text, stray closing tags are dropped and unclosed tags are closed
/// at the end.
#[must_use]
pub fn sanitize_telegram_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut open: Vec<String> = Vec::new();
    let mut cursor = 0;

    for caps in TAG_RE.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape_text(&input[cursor..whole.start()]));
        cursor = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        let attrs = caps.get(3).map_or("", |m| m.as_str());

        if name == "br" {
            out.push('\n');
            continue;
        }

        if !ALLOWED_TAGS.contains(&name.as_str()) {
            out.push_str(&escape_html(whole.as_str()));
            continue;
        }

        if closing {
            if let Some(pos) = open.iter().rposition(|t| *t == name) {
                for tag in open.drain(pos..).rev() {
                    out.push_str(&format!("</{tag}>"));
                }
            }
            continue;
        }

        if attrs.trim_end().ends_with('/') {
            continue;
        }

        match opening_tag(&name, attrs) {
            Some(tag) => {
                out.push_str(&tag);
                open.push(name);
            }
            None => out.push_str(&escape_html(whole.as_str())),
        }
    }

    out.push_str(&escape_text(&input[cursor..]));
    for tag in open.iter().rev() {
        out.push_str(&format!("</{tag}>"));
    }
    out
}

fn opening_tag(name: &str, attrs: &str) -> Option<String> {
    match name {
        "a" => {
            let href = HREF_RE.captures(attrs).and_then(|c| {
                c.get(1)
                    .or_else(|| c.get(2))
                    .or_else(|| c.get(3))
                    .map(|m| m.as_str().trim().to_string())
            })?;
            let lower = href.to_ascii_lowercase();
            let allowed_scheme = ["http://", "https://", "tg://", "mailto:"]
                .iter()
                .any(|scheme| lower.starts_with(scheme));
            if !allowed_scheme {
                return None;
            }
            Some(format!("<a href=\"{}\">", escape_html(&unescape_html(&href))))
        }
        "span" => {
            let class = class_attr(attrs)?;
            (class == "tg-spoiler").then(|| "<span class=\"tg-spoiler\">".to_string())
        }
        "code" => match class_attr(attrs) {
            Some(class) if class.starts_with("language-") && !class.contains(['"', '<', '>']) => {
                Some(format!("<code class=\"{class}\">"))
            }
            _ => Some("<code>".to_string()),
        },
        "blockquote" if attrs.to_ascii_lowercase().contains("expandable") => {
            Some("<blockquote expandable>".to_string())
        }
        _ => Some(format!("<{name}>")),
    }
}

fn class_attr(attrs: &str) -> Option<String> {
    CLASS_RE.captures(attrs).and_then(|c| {
        c.get(1)
            .or_else(|| c.get(2))
            .map(|m| m.as_str().trim().to_string())
    })
}

/// Escape a text run, keeping entities that are already valid.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, c) in text.char_indices() {
        match c {
            '&' if ENTITY_RE.is_match(&text[idx..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode HTML entities back to text.
#[must_use]
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Plain-text rendering of an HTML message, used when Telegram rejects the markup.
///
/// Links keep their target: `<a href="u">label</a>` becomes `label (u)`, or
/// just `u` when the label is the URL itself.
#[must_use]
pub fn html_to_plain_text(html: &str) -> String {
    let linked = ANCHOR_RE.replace_all(html, |caps: &regex::Captures<'_>| {
        let label = caps.get(2).map_or("", |m| m.as_str());
        let href = caps
            .get(1)
            .and_then(|attrs| HREF_RE.captures(attrs.as_str()))
            .and_then(|h| h.get(1).or_else(|| h.get(2)).or_else(|| h.get(3)))
            .map(|m| m.as_str().trim())
            .filter(|href| !href.is_empty());
        let Some(href) = href else {
            return label.to_string();
        };
        let label_text = TAG_RE.replace_all(label, "");
        if label_text.trim().is_empty() || unescape_html(label_text.trim()) == unescape_html(href) {
            href.to_string()
        } else {
            format!("{label} ({href})")
        }
    });
    let stripped = TAG_RE.replace_all(&linked, |caps: &regex::Captures<'_>| {
        if caps[2].eq_ignore_ascii_case("br") {
            "\n".to_string()
        } else {
            String::new()
        }
    });
    unescape_html(&stripped)
}
