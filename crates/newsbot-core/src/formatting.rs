//! Text helpers shared by the feed adapter, the packer and the adapters.

use std::{fmt::Display, sync::OnceLock};

use chrono::{DateTime, TimeZone};
use regex::Regex;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape characters that would end a Markdown link label early.
pub fn escape_link_label(text: &str) -> String {
    text.replace('[', "(").replace(']', ")")
}

/// Remove markup tags, decode the handful of entities feeds commonly leave
/// behind, and collapse whitespace runs.
pub fn strip_tags(raw: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"));
    let text = tag_re.replace_all(raw, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&#8217;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters; longer input keeps
/// `max_chars - 3` characters followed by `...`.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    format!("{}...", s.chars().take(keep).collect::<String>())
}

/// Keep the first `keep` characters and append `...` when anything was cut.
pub fn clip(s: &str, keep: usize) -> String {
    if s.chars().count() <= keep {
        return s.to_string();
    }
    format!("{}...", s.chars().take(keep).collect::<String>())
}

/// Compact display timestamp, e.g. `3:05pm 10/18`.
pub fn format_display_time<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let s = dt.format("%I:%M%p %m/%d").to_string().to_lowercase();
    s.trim_start_matches('0').to_string()
}

/// Trim `s` in place so it does not end with whitespace.
pub fn trim_end_in_place(s: &mut String) {
    let len = s.trim_end().len();
    s.truncate(len);
}
