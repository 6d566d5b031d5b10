//! Generation configuration.
//!
//! Loads configuration from a TOML file with sensible defaults; a missing
//! file yields the defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default value for serde when indent is missing.
fn default_indent() -> String {
    Config::DEFAULT_INDENT.to_string()
}

/// Default value for serde when fetch_timeout_secs is missing.
fn default_fetch_timeout_secs() -> u64 {
    Config::DEFAULT_FETCH_TIMEOUT_SECS
}

/// Generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Indent string used when pretty-printing the page's structural
    /// description (and for statement indentation inside `run`).
    #[serde(default = "default_indent")]
    pub indent: String,

    /// Timeout in seconds for fetching a remote script (0 disables).
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// When true, an outer script that cannot be resolved fails the whole
    /// generation instead of being silently skipped.
    pub strict_outer: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            strict_outer: false,
        }
    }
}

impl Config {
    const DEFAULT_INDENT: &str = "  ";
    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Remote-fetch timeout, or None when disabled.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        if self.fetch_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.fetch_timeout_secs))
        }
    }
}
