//! Output generation for the JSON and HTML digest.
//!
//! # Submodules
//!
//! - [`json`]: writes `articles.json` for API consumers
//! - [`html`]: writes `index.html` for readers
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── articles.json   # { "articles": [...] }
//! └── index.html      # styled digest with a "last updated" line
//! ```
//!
//! Both files are replaced on every export.

pub mod html;
pub mod json;

use crate::error::ExportError;
use crate::models::DigestEntry;
use crate::utils::{ensure_dir, local_timestamp};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Where an export wrote its files.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Write the digest as JSON and HTML into `output_dir`, creating it if needed.
#[instrument(level = "info", skip(entries), fields(count = entries.len()))]
pub async fn export(entries: &[DigestEntry], output_dir: &str) -> Result<ExportPaths, ExportError> {
    let dir = Path::new(output_dir);
    ensure_dir(dir).await.map_err(|source| ExportError::Io {
        path: output_dir.to_string(),
        source,
    })?;

    let json = json::write_digest(entries, dir).await?;
    let html = html::write_page(entries, dir, &local_timestamp()).await?;

    info!(json = %json.display(), html = %html.display(), "Export complete");
    Ok(ExportPaths { json, html })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Summary;

    #[tokio::test]
    async fn test_export_creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("nested").join("public");
        let out_str = out.to_str().unwrap();

        let entries = vec![DigestEntry {
            originalTitle: "A".to_string(),
            translatedTitle: "A".to_string(),
            summary: Summary::default(),
            url: "https://example.com/a".to_string(),
            date: String::new(),
        }];

        let paths = export(&entries, out_str).await.unwrap();
        assert!(paths.json.exists());
        assert!(paths.html.exists());

        // second run over an existing directory
        let again = export(&entries, out_str).await.unwrap();
        assert_eq!(
            std::fs::read(&paths.json).unwrap(),
            std::fs::read(&again.json).unwrap()
        );
    }

    #[tokio::test]
    async fn test_export_fails_when_directory_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("occupied");
        std::fs::write(&file, "x").unwrap();

        let err = export(&[], file.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
