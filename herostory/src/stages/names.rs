//! Hero name cleanup.

use regex::Regex;
use std::sync::OnceLock;

/// Name used when the model returns nothing usable.
pub const FALLBACK_HERO_NAME: &str = "the hero";

const MAX_NAME_CHARS: usize = 60;

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:the\s+)?(?:hero(?:'s)?\s+)?name(?:\s+is)?\s*[:\-]?[\s*_`]+")
            .expect("name label pattern is valid")
    })
}

/// Reduces a model reply to a bare name.
///
/// Returns `None` for replies that do not look like a name: empty, longer
/// than 60 characters, without letters, or an explicit "unknown".
#[must_use]
pub fn clean_hero_name(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;

    let trimmed = line.trim_matches(|c: char| matches!(c, '*' | '_' | '#' | '`' | '>') || c.is_whitespace());
    let unlabelled = label_pattern().replace(trimmed, "");
    let name = unlabelled
        .trim_matches(|c: char| {
            matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}' | '*' | '_' | '`')
                || c.is_whitespace()
        })
        .trim_end_matches(['.', ',', ';', ':', '!']);

    if name.is_empty()
        || name.chars().count() > MAX_NAME_CHARS
        || !name.chars().any(char::is_alphabetic)
        || matches!(name.to_lowercase().as_str(), "unknown" | "none" | "n/a")
    {
        return None;
    }
    Some(name.to_string())
}

/// Like [`clean_hero_name`], substituting [`FALLBACK_HERO_NAME`].
#[must_use]
pub fn hero_name_or_fallback(reply: &str) -> String {
    clean_hero_name(reply).unwrap_or_else(|| FALLBACK_HERO_NAME.to_string())
}
