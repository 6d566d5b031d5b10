//! Atomic file writes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tokio::fs;

/// Writes `contents` to `path` atomically (temp sibling + rename),
/// creating parent directories as needed.
///
/// The temp name is pid-qualified so concurrent processes writing the
/// same target never interleave; the final rename is last-writer-wins.
///
/// # Errors
/// Returns an error if any filesystem operation fails.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp = temp_sibling(path)?;
    fs::write(&tmp, contents)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("Failed to move {} into place", path.display()));
    }

    Ok(())
}

fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Invalid output path: {}", path.display()))?;
    Ok(path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id())))
}
