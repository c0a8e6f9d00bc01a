//! Paragraph splitting and HTML markup for generated prose.

use regex::Regex;
use std::sync::OnceLock;

fn blank_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("blank line pattern is valid"))
}

/// Splits prose on blank lines.
///
/// Line endings are normalized, runs of blank lines count as one break and
/// empty paragraphs are dropped.
#[must_use]
pub fn paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    blank_line_pattern()
        .split(&normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Escapes the five HTML-significant characters.
#[must_use]
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

/// Renders prose as `<p>` elements, one per paragraph.
///
/// Single line breaks inside a paragraph become `<br>`.
#[must_use]
pub fn to_html(text: &str) -> String {
    paragraphs(text)
        .iter()
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape_html(l.trim())).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
