//! Content-addressed caching of external scripts.
//!
//! Each fetched external script is persisted once per distinct adjusted
//! content under `{base_name}-{fingerprint}.js`, wrapped so its implicit
//! execution context binds to the simulated window. Writes are
//! unconditional overwrites; content addressing makes repeats idempotent.

use std::path::{Path, PathBuf};

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::io;

/// Extension of cached runtime modules.
pub const MODULE_EXT: &str = "js";

/// Hex characters kept from the content hash for the filename component.
const FINGERPRINT_LEN: usize = 10;

/// Identity of a deduplicated external script on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedModuleRecord {
    pub fingerprint: String,
    pub filename: String,
    pub path: PathBuf,
}

/// Short content hash of the adjusted script text, filename-safe.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(FINGERPRINT_LEN);
    for byte in digest.iter().take(FINGERPRINT_LEN.div_ceil(2)) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Derives the cache filename for a script: base name of `src` with its
/// extension (and any URL query/fragment) stripped, plus the fingerprint.
pub fn module_filename(src: &str, fingerprint: &str) -> String {
    let base = base_name(src);
    format!("{base}-{fingerprint}.{MODULE_EXT}")
}

fn base_name(src: &str) -> String {
    let trimmed = src
        .split(['?', '#'])
        .next()
        .unwrap_or(src)
        .trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => name,
    };

    if stem.is_empty() {
        "script".to_string()
    } else {
        stem.to_string()
    }
}

/// Wraps adjusted script text as a sandbox-invocation module.
///
/// The exported function shadows `module` to `undefined` so the script
/// cannot observe the host module system, aliases `global` to the
/// supplied window, and runs the body with `this` bound to the window.
pub fn wrap_sandboxed(adjusted: &str) -> String {
    [
        "module.exports=function(window,document){",
        "var module=undefined;",
        "var global=window;",
        &format!("(function(){{{adjusted}}}).call(window)"),
        "};",
    ]
    .concat()
}

/// Persists the wrapped module for `src` under `common_output`.
///
/// # Errors
/// Returns an error if the write fails.
pub async fn write_cached_module(
    common_output: &Path,
    src: &str,
    adjusted: &str,
) -> Result<CachedModuleRecord> {
    let fingerprint = fingerprint(adjusted);
    let filename = module_filename(src, &fingerprint);
    let path = common_output.join(&filename);

    io::write_atomic(&path, &wrap_sandboxed(adjusted)).await?;
    tracing::debug!(src, file = %path.display(), "cached external script");

    Ok(CachedModuleRecord {
        fingerprint,
        filename,
        path,
    })
}
