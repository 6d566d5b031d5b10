//! Script references and source classification.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One entry in a page's script list, as produced by the upstream parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptRef {
    /// Script content embedded directly in the page markup.
    Inline { content: String },
    /// Script referenced by path or URL from the page markup.
    Outer { src: String },
}

/// Where an outer script's text lives.
///
/// Classified by syntax alone: filesystem state never changes the
/// classification of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSource {
    /// Path resolved against the page entry's directory.
    Relative,
    /// Absolute local path.
    Absolute,
    /// Remote URL, fetched over HTTP(S).
    Remote,
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ScriptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptSource::Relative => "relative",
            ScriptSource::Absolute => "absolute",
            ScriptSource::Remote => "remote",
        }
    }
}

/// Classifies an outer script's `src` string.
///
/// `http://`, `https://`, and protocol-relative `//` prefixes are remote;
/// otherwise absolute vs relative is decided by the path syntax.
pub fn classify(src: &str) -> ScriptSource {
    let trimmed = src.trim_start();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") || trimmed.starts_with("//")
    {
        return ScriptSource::Remote;
    }

    if Path::new(src).is_absolute() {
        ScriptSource::Absolute
    } else {
        ScriptSource::Relative
    }
}
