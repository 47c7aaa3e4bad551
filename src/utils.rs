//! Utility functions for logging, date display and the filesystem.

use chrono::{DateTime, Local};
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (moved back to a char boundary) with
/// an ellipsis and the number of dropped bytes appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Format a feed date for display as `YYYY-MM-DD HH:MM` in its own offset.
///
/// RFC 2822 (RSS `pubDate`) and RFC 3339 are recognised; anything else is
/// returned unchanged.
pub fn format_display_date(raw: &str) -> String {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Current local time for the "last updated" line.
pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Create a directory (and parents) if it does not exist yet.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    debug!("Output directory ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // each Hangul syllable is 3 bytes
        let s = "연합뉴스";
        assert_eq!(truncate_for_log(s, 4), "연…(+9 bytes)");
    }

    #[test]
    fn test_format_display_date() {
        assert_eq!(
            format_display_date("Tue, 06 May 2025 10:00:00 +0900"),
            "2025-05-06 10:00"
        );
        assert_eq!(format_display_date("2025-05-06T08:30:00Z"), "2025-05-06 08:30");
        assert_eq!(format_display_date("yesterday"), "yesterday");
        assert_eq!(format_display_date(""), "");
    }
}
