// src/text.rs
//! Text cleanup shared by providers, the scorer, and display code.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Strip backend markup from a title/description: decode HTML entities,
/// drop tags, collapse whitespace. Markup must never reach keyword matching.
pub fn strip_markup(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip tags (portal verticals wrap query hits in <b>…</b>)
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Normalize a lookup key: lowercase, trimmed, single-spaced.
pub fn normalize_key(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
