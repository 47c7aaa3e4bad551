//! JSON output for the API and static hosting.
//!
//! The document is `{ "articles": [...] }`, pretty-printed. It carries no
//! timestamp, so identical entries always produce identical bytes.

use crate::error::ExportError;
use crate::models::DigestEntry;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const JSON_FILENAME: &str = "articles.json";

#[derive(Serialize)]
struct DigestDocument<'a> {
    articles: &'a [DigestEntry],
}

/// Serialize entries as the digest JSON document.
pub fn render_json(entries: &[DigestEntry]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&DigestDocument { articles: entries })?)
}

/// Write `articles.json` into `output_dir`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_digest(entries: &[DigestEntry], output_dir: &Path) -> Result<PathBuf, ExportError> {
    let json = render_json(entries)?;
    let path = output_dir.join(JSON_FILENAME);

    fs::write(&path, json).await.map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), count = entries.len(), "Wrote JSON digest");
    Ok(path)
}
