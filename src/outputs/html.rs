//! Static HTML page for the digest.
//!
//! The page is regenerated wholesale on every export; only the "last
//! updated" line depends on when it was rendered.

use crate::error::ExportError;
use crate::models::DigestEntry;
use crate::utils::format_display_date;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

pub const HTML_FILENAME: &str = "index.html";

const HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>News Digest</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #222; background: #fafafa; }
  h1 { font-size: 1.8rem; margin-bottom: 0.2rem; }
  .updated { color: #777; font-size: 0.9rem; margin-bottom: 2rem; }
  .article { background: #fff; border: 1px solid #e5e5e5; border-radius: 8px; padding: 1.2rem 1.4rem; margin-bottom: 1.2rem; }
  .article h2 { font-size: 1.25rem; margin: 0 0 0.4rem; }
  .meta { color: #777; font-size: 0.85rem; margin-bottom: 0.8rem; }
  .meta a { color: #3366cc; }
  blockquote { border-left: 3px solid #ccc; margin: 0.8rem 0; padding-left: 0.8rem; color: #555; font-style: italic; }
  .interest { margin-top: 0.6rem; }
</style>
</head>
<body>
<h1>News Digest</h1>
"#;

const FOOTER: &str = "</body>\n</html>\n";

/// Only web links become anchors; `javascript:` and other schemes are dropped.
fn is_web_link(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn render_entry(out: &mut String, entry: &DigestEntry) -> fmt::Result {
    writeln!(out, "<div class=\"article\">")?;
    writeln!(out, "  <h2>{}</h2>", encode_text(&entry.translatedTitle))?;
    let date = encode_text(&format_display_date(&entry.date)).into_owned();
    if is_web_link(&entry.url) {
        writeln!(
            out,
            "  <div class=\"meta\">{} · <a href=\"{}\" target=\"_blank\" rel=\"noopener\">Original article</a></div>",
            date,
            encode_double_quoted_attribute(&entry.url)
        )?;
    } else {
        writeln!(out, "  <div class=\"meta\">{date}</div>")?;
    }
    if !entry.summary.quote.trim().is_empty() {
        writeln!(out, "  <blockquote>{}</blockquote>", encode_text(&entry.summary.quote))?;
    }
    writeln!(out, "  <p>{}</p>", encode_text(&entry.summary.text))?;
    writeln!(
        out,
        "  <div class=\"interest\">Interest: {}</div>",
        encode_text(&entry.summary.interestLevel)
    )?;
    writeln!(out, "</div>")
}

/// Render the whole page.
pub fn render_html(entries: &[DigestEntry], updated_at: &str) -> Result<String, fmt::Error> {
    let mut out = String::from(HEADER);
    writeln!(out, "<p class=\"updated\">Last updated: {}</p>", encode_text(updated_at))?;
    for entry in entries {
        render_entry(&mut out, entry)?;
    }
    out.push_str(FOOTER);
    Ok(out)
}

/// Write `index.html` into `output_dir`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_page(
    entries: &[DigestEntry],
    output_dir: &Path,
    updated_at: &str,
) -> Result<PathBuf, ExportError> {
    let path = output_dir.join(HTML_FILENAME);
    let page = render_html(entries, updated_at)?;
    fs::write(&path, page)
        .await
        .map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
    info!(path = %path.display(), count = entries.len(), "Wrote HTML digest");
    Ok(path)
}
