//! Page runtime generation pipeline.
//!
//! Drives the whole subsystem for one page: walks the script list in
//! declaration order, inlines adjusted inline scripts, fetches/caches
//! outer scripts, then writes the assembled runtime and the page's
//! structural description.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;

use crate::adjust::Adjuster;
use crate::cache::{self, CachedModuleRecord};
use crate::config::Config;
use crate::fetch::ScriptFetcher;
use crate::io;
use crate::runtime::RuntimeBuilder;
use crate::script::ScriptRef;

/// Inputs for one page's generation.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Page entry file; only its directory is used, for relative resolution.
    pub entry: PathBuf,
    /// Destination of the runtime module.
    pub output: PathBuf,
    /// Directory receiving cached external-script modules.
    pub common_output: PathBuf,
    /// Page scripts in original declaration order.
    pub js_list: Vec<ScriptRef>,
    /// The page's structural description, serialized verbatim.
    pub body: Value,
    /// Page identifier embedded in the runtime as a constant.
    pub entry_key: String,
    /// When true, request compression from the adjuster and serialize the
    /// structural description compactly.
    pub compress_js: bool,
    /// Optional proxy descriptor for remote fetches.
    pub proxy: Option<String>,
}

/// What one `generate` call produced.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub runtime_path: PathBuf,
    pub ast_path: PathBuf,
    pub cached_modules: Vec<CachedModuleRecord>,
    /// Outer `src` values that resolved to no content and were skipped.
    pub skipped: Vec<String>,
}

/// Generates the page runtime, cached modules, and structural-description
/// file for one page.
///
/// References are processed strictly sequentially; the runtime's script
/// execution order is observable, so fetches are never parallelized.
///
/// # Errors
/// Returns an error on any write failure, on adjustment failure, and —
/// in strict mode — on an outer reference that is unresolvable or
/// resolves to empty content. In lenient mode such references are
/// skipped and reported instead.
pub async fn generate(
    options: &GenerateOptions,
    adjuster: &dyn Adjuster,
    config: &Config,
) -> Result<GenerateReport> {
    let base_dir = options.entry.parent().unwrap_or_else(|| Path::new(""));
    let fetcher = ScriptFetcher::new(options.proxy.as_deref(), config.fetch_timeout())?;

    let mut builder = RuntimeBuilder::new(&options.entry_key, &config.indent);
    let mut cached_modules = Vec::new();
    let mut skipped = Vec::new();

    for js in &options.js_list {
        match js {
            ScriptRef::Inline { content } => {
                let adjusted = adjuster
                    .adjust(content, options.compress_js)
                    .context("Failed to adjust inline script")?;
                builder.push_inline(&adjusted);
            }
            ScriptRef::Outer { src } => {
                let text = match fetcher.fetch(src, base_dir).await {
                    Ok(text) => text,
                    Err(e) if e.is_resolution_failure() => {
                        if config.strict_outer {
                            bail!("Failed to resolve outer script '{src}': {e}");
                        }
                        tracing::warn!(src = %src, error = %e, "skipping unresolvable outer script");
                        skipped.push(src.clone());
                        continue;
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("Failed to read outer script '{src}'"));
                    }
                };

                if text.is_empty() {
                    if config.strict_outer {
                        bail!("Outer script '{src}' resolved to empty content");
                    }
                    tracing::warn!(src = %src, "skipping outer script with empty content");
                    skipped.push(src.clone());
                    continue;
                }

                let adjusted = adjuster
                    .adjust(&text, options.compress_js)
                    .with_context(|| format!("Failed to adjust outer script '{src}'"))?;
                let record =
                    cache::write_cached_module(&options.common_output, src, &adjusted).await?;
                builder.push_outer(src, &record.filename);
                cached_modules.push(record);
            }
        }
    }

    let runtime = builder.finish();
    io::write_atomic(&options.output, &runtime)
        .await
        .context("Failed to write page runtime")?;

    let ast_path = ast_path(&options.output);
    let ast_module = format!(
        "module.exports = {};",
        serialize_body(&options.body, options.compress_js, &config.indent)?
    );
    io::write_atomic(&ast_path, &ast_module)
        .await
        .context("Failed to write page structural description")?;

    tracing::info!(
        runtime = %options.output.display(),
        ast = %ast_path.display(),
        cached = cached_modules.len(),
        skipped = skipped.len(),
        "generated page runtime"
    );

    Ok(GenerateReport {
        runtime_path: options.output.clone(),
        ast_path,
        cached_modules,
        skipped,
    })
}

/// Fixed sibling filename of the structural-description file.
fn ast_path(output: &Path) -> PathBuf {
    let dir = output.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("ast.{}", cache::MODULE_EXT))
}

fn serialize_body(body: &Value, compress: bool, indent: &str) -> Result<String> {
    if compress {
        return serde_json::to_string(body).context("Failed to serialize page description");
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    body.serialize(&mut serializer)
        .context("Failed to serialize page description")?;
    String::from_utf8(buf).context("Serialized page description is not UTF-8")
}
