use crate::utils::truncate_chars;

/// Input ceiling for the summarizer, in characters of article text.
pub const MAX_ARTICLE_CHARS: usize = 30_000;

const SUMMARIZATION_PROMPT_TEMPLATE: &str = "You summarize articles for a Telegram channel.
Write the summary in Telegram HTML. Use only these tags: <b>, <i>, <u>, <s>, <a href=\"...\">, <code>, <pre>, <blockquote>.
Do not use Markdown, headings, lists with <ul>/<li>, or <br>; use plain newlines instead.

Structure:
<b>Title of the article</b>
<blockquote>Two or three sentences with the overview.</blockquote>
Then up to five short lines with the key takeaways, each starting with \"• \".

Be concise and specific. Never invent facts that are not in the article.

Article content:
{text}";

/// Strip control characters (keeping newlines and tabs) from scraped text.
#[must_use]
pub fn sanitize_article(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}

/// Build the summarization prompt for an article, bounded to
/// [`MAX_ARTICLE_CHARS`] characters of input.
#[must_use]
pub fn build_summary_prompt(article: &str) -> String {
    let text = sanitize_article(truncate_chars(article, MAX_ARTICLE_CHARS));
    SUMMARIZATION_PROMPT_TEMPLATE.replace("{text}", &text)
}
