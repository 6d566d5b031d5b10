//! Content adjustment seam.
//!
//! Minification/normalization is an external collaborator; the pipeline
//! only depends on this trait. A failing adjustment aborts the whole
//! generation.

use anyhow::Result;

/// Pure transformation applied to every script body before emission.
pub trait Adjuster: Send + Sync {
    /// Adjusts script content; `compress` requests minified output.
    ///
    /// # Errors
    /// Returns an error if the content cannot be transformed.
    fn adjust(&self, content: &str, compress: bool) -> Result<String>;
}

/// Identity adjuster for hosts that minify elsewhere (and for tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAdjuster;

impl Adjuster for PassthroughAdjuster {
    fn adjust(&self, content: &str, _compress: bool) -> Result<String> {
        Ok(content.to_string())
    }
}
