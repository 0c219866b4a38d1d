use std::sync::OnceLock;

use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

use crate::config::ReplyFormat;

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("valid inline code pattern"))
}

fn block_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</p>|<br\s*/?>|</li>|</h[1-6]>|</pre>|</tr>").expect("valid block pattern"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

/// Escape HTML to prevent XSS
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Wrap `` `code` `` spans in `<code>` elements
pub fn inline_code(text: &str) -> String {
    inline_code_re().replace_all(text, "<code>$1</code>").into_owned()
}

/// One `<p>` per non-blank line
pub fn group_paragraphs(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("<p>{}</p>", line))
        .collect()
}

/// Render what the reader typed
pub fn render_outgoing(text: &str) -> String {
    group_paragraphs(&inline_code(&escape_html(text)))
}

/// Render markdown to HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    // highlight.js picks up code blocks by class
    html_output.replace("<pre><code", "<pre><code class=\"hljs\"")
}

/// Render a backend reply
pub fn render_reply(text: &str, format: ReplyFormat) -> String {
    match format {
        ReplyFormat::Html => text.to_string(),
        ReplyFormat::Markdown => render_markdown(text),
    }
}

/// Flatten rendered HTML into plain text for terminals
pub fn html_to_text(html: &str) -> String {
    let with_breaks = block_end_re().replace_all(html, "\n");
    let stripped = tag_re().replace_all(&with_breaks, "");
    let decoded = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
