//! Page text signals for the oracle: title, meta description, main text.
//!
//! Main text follows a readability-style heuristic: take the most specific
//! content container (`article`, `main`, `[role=main]`, then `body`), walk
//! its block elements and loose text, and skip boilerplate regions, tables,
//! and comment threads. Everything here is pure and returns empty strings rather than
//! failing.

use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;

/// Containers tried in order when looking for the main content.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=main]", "body"];

/// Elements whose text never counts as main content.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "form",
    "table", "iframe", "svg", "button", "select",
];

/// Block elements whose text forms the excerpt.
const TEXT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre", "dd", "dt", "figcaption",
];

/// Phrasing elements folded into the surrounding text block.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "br", "cite", "code", "em", "i", "kbd", "mark", "q", "s", "small",
    "span", "strong", "sub", "sup", "time", "u", "wbr",
];

/// Text signals for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageContent {
    pub title: String,
    pub description: String,
    pub excerpt: String,
}

/// Extract title, description, and a main-text excerpt of at most `max_chars`.
pub fn extract(html: &str, max_chars: usize) -> PageContent {
    let (title, description) = extract_meta(html);
    PageContent {
        title,
        description,
        excerpt: extract_main_text(html, max_chars),
    }
}

/// `<title>` text and `<meta name="description">` content, trimmed.
pub fn extract_meta(html: &str) -> (String, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();

    let description = Selector::parse("meta[name][content]")
        .ok()
        .and_then(|sel| {
            document.select(&sel).find(|el| {
                el.value()
                    .attr("name")
                    .is_some_and(|n| n.trim().eq_ignore_ascii_case("description"))
            })
        })
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    (title, description)
}

/// Main text of the page, truncated to `max_chars` characters.
pub fn extract_main_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    // The chosen root is never rejected for its id or class; only its
    // descendants are.
    let Some(root) = CONTENT_ROOTS.iter().find_map(|css| {
        let sel = Selector::parse(css).ok()?;
        document.select(&sel).next()
    }) else {
        return String::new();
    };

    let mut blocks = Vec::new();
    collect_blocks(root, &mut blocks);
    truncate_chars(blocks.join("\n").trim(), max_chars)
}

/// Text blocks under `el`. Runs of loose text and inline elements between
/// block children form one block each.
fn collect_blocks(el: ElementRef<'_>, blocks: &mut Vec<String>) {
    let mut inline = String::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => inline.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_boilerplate(&child) {
                    continue;
                }
                let tag = child.value().name();
                if INLINE_TAGS.contains(&tag) {
                    inline.push_str(&child.text().collect::<String>());
                    continue;
                }
                flush(&mut inline, blocks);
                if TEXT_TAGS.contains(&tag) {
                    push_block(&child.text().collect::<String>(), blocks);
                } else {
                    collect_blocks(child, blocks);
                }
            }
            _ => {}
        }
    }
    flush(&mut inline, blocks);
}

fn flush(inline: &mut String, blocks: &mut Vec<String>) {
    push_block(inline, blocks);
    inline.clear();
}

fn push_block(raw: &str, blocks: &mut Vec<String>) {
    let text = collapse_whitespace(raw);
    if !text.is_empty() {
        blocks.push(text);
    }
}

fn is_boilerplate(el: &ElementRef<'_>) -> bool {
    let value = el.value();
    if SKIPPED_TAGS.contains(&value.name()) {
        return true;
    }
    if value.attr("role").is_some_and(|r| r == "navigation" || r == "complementary") {
        return true;
    }
    let marker = format!(
        "{} {}",
        value.attr("id").unwrap_or(""),
        value.attr("class").unwrap_or("")
    )
    .to_lowercase();
    marker.contains("comment") || marker.contains("cookie")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
