//! Document persistence: one JSON file per document, written atomically
//! (temp file + rename) so the watcher never reads a half-written document.

use crate::compile::CompiledDocument;
use crate::error::Result;
use std::path::{Path, PathBuf};

pub const DOCUMENT_SUFFIX: &str = ".bom.json";

/// Keep alphanumerics, `-`, `_`, `.`; map everything else to `-`.
#[must_use]
pub fn safe_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Sanitized filename token with a fallback for values that sanitize away
/// entirely. Prevents outputs like `unknown-`.
#[must_use]
pub fn safe_token(value: &str, fallback: &str) -> String {
    let token = safe_filename(value);
    let token = token.trim_matches('-').trim();
    if token.is_empty() {
        safe_filename(fallback)
    } else {
        token.to_string()
    }
}

/// Remove previous document outputs from `dir`. Returns how many files were
/// removed; a missing directory counts as clean.
pub async fn clean_documents(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(DOCUMENT_SUFFIX) {
            if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                log::debug!("failed to remove {}: {err}", entry.path().display());
            } else {
                removed += 1;
            }
        }
    }
    if removed > 0 {
        log::info!("cleaned {removed} previous document outputs");
    }
    Ok(removed)
}

/// Write every document under `dir` as `<stem>.bom.json`.
pub async fn write_documents(dir: &Path, documents: &[CompiledDocument]) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;
    let mut written = Vec::with_capacity(documents.len());
    for compiled in documents {
        let path = dir.join(format!("{}{DOCUMENT_SUFFIX}", compiled.file_stem));
        let bytes = serde_json::to_vec_pretty(&compiled.document)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::debug!("wrote document {}", path.display());
        written.push(path);
    }
    Ok(written)
}
