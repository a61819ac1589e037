use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse a Canvas ISO-8601 timestamp into UTC.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a raw Canvas timestamp for display, e.g. "October 9, 2025 at 11:59 PM".
///
/// A missing date becomes "No date"; a string that fails to parse is returned
/// unchanged so the caller still has something to show.
pub fn format_datetime(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "No date".to_string();
    };
    match parse_utc(raw) {
        Some(dt) => dt.format("%B %-d, %Y at %-I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

/// Strip HTML from a Canvas rich-text body and clamp it for chat display:
/// tags removed, the usual entities decoded, whitespace collapsed, and the
/// result truncated to `max` characters with a trailing "...".
pub fn sanitize_html(input: &str, max: usize) -> String {
    let text = TAG_RE.replace_all(input, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let text = WS_RE.replace_all(&text, " ");
    let text = text.trim();

    if text.chars().count() > max {
        let truncated: String = text.chars().take(max).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_rfc3339_for_display() {
        assert_eq!(
            format_datetime(Some("2025-10-09T23:59:00Z")),
            "October 9, 2025 at 11:59 PM"
        );
        assert_eq!(
            format_datetime(Some("2025-03-01T09:05:00Z")),
            "March 1, 2025 at 9:05 AM"
        );
    }

    #[test]
    fn missing_date_is_no_date() {
        assert_eq!(format_datetime(None), "No date");
    }

    #[test]
    fn malformed_date_passes_through_unchanged() {
        assert_eq!(format_datetime(Some("next tuesday")), "next tuesday");
        assert_eq!(format_datetime(Some("")), "");
    }

    #[test]
    fn parses_utc_offsets() {
        let dt = parse_utc("2025-10-09T19:59:00-04:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-10-09T23:59:00+00:00");
        assert!(parse_utc("garbage").is_none());
    }

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<p>Hello <b>world</b>!</p>\n\n<p>Second&nbsp;&amp; last.</p>";
        assert_eq!(sanitize_html(html, 300), "Hello world ! Second & last.");
    }

    #[test]
    fn truncates_long_messages_with_ellipsis() {
        let long = "x".repeat(500);
        let out = sanitize_html(&long, 300);
        assert_eq!(out.chars().count(), 303);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn short_messages_are_untouched() {
        assert_eq!(sanitize_html("plain text", 300), "plain text");
    }
}
