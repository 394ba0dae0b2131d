//! Message text to HTML.
//!
//! Message bodies are plain text from the user or the assistant. Rendering
//! escapes everything, then applies three substitutions: fenced code blocks,
//! inline code spans and bare URLs. Code is never linked.

use std::sync::LazyLock;

use regex::Regex;

/// Fenced blocks first so their backticks are not read as inline spans.
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```([^`]+)```|`([^`]+)`").expect("code span regex is valid")
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`]+"#).expect("url regex is valid"));

/// Punctuation that ends a sentence rather than a URL.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Render message text as an HTML fragment.
pub fn format_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;

    for caps in CODE_RE.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always matches");
        push_text(&mut out, &text[last..whole.start()]);

        if let Some(block) = caps.get(1) {
            out.push_str("<pre><code>");
            out.push_str(&escape_html(block.as_str()));
            out.push_str("</code></pre>");
        } else if let Some(span) = caps.get(2) {
            out.push_str("<code>");
            out.push_str(&escape_html(span.as_str()));
            out.push_str("</code>");
        }

        last = whole.end();
    }
    push_text(&mut out, &text[last..]);

    out
}

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain prose: link URLs, escape the rest, keep line breaks.
fn push_text(out: &mut String, text: &str) {
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(URL_TRAILING);
        push_escaped_lines(out, &text[last..m.start()]);

        let escaped = escape_html(url);
        out.push_str("<a href=\"");
        out.push_str(&escaped);
        out.push_str("\" target=\"_blank\" rel=\"noopener\">");
        out.push_str(&escaped);
        out.push_str("</a>");

        last = m.start() + url.len();
    }
    push_escaped_lines(out, &text[last..]);
}

fn push_escaped_lines(out: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        out.push_str(&escape_html(line));
    }
}
