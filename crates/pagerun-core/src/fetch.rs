//! Content fetching for outer script references.
//!
//! Resolves a `src` to its literal text from one of three sources:
//! relative path (against the page entry's directory), absolute local
//! path, or remote URL. No retries; one failed reference must not abort
//! its siblings, so failures are classified rather than bailed on.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs;
use url::Url;

use crate::script::{self, ScriptSource};

/// Categories of fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Local path does not exist.
    NotFound,
    /// `src` looked remote but is not a valid URL.
    InvalidUrl,
    /// Remote host answered with a non-2xx status.
    HttpStatus,
    /// Remote fetch timed out.
    Timeout,
    /// Connection-level failure reaching the remote host.
    Network,
    /// Local read failed for a reason other than absence.
    Io,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::NotFound => "not_found",
            FetchErrorKind::InvalidUrl => "invalid_url",
            FetchErrorKind::HttpStatus => "http_status",
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::Network => "network",
            FetchErrorKind::Io => "io",
        };
        write!(f, "{name}")
    }
}

/// Structured fetch failure with kind and a one-line summary.
#[derive(Debug, Clone)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether this failure means the reference could not be resolved,
    /// as opposed to a local I/O fault that should always be fatal.
    pub fn is_resolution_failure(&self) -> bool {
        self.kind != FetchErrorKind::Io
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

/// Fetches outer script content from local paths or remote URLs.
pub struct ScriptFetcher {
    client: reqwest::Client,
}

impl ScriptFetcher {
    /// Builds a fetcher; the proxy and timeout apply to remote fetches only.
    ///
    /// # Errors
    /// Returns an error if the proxy descriptor is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(proxy: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy descriptor: {proxy}"))?;
            builder = builder.proxy(proxy);
        }

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Resolves `src` to its literal text.
    ///
    /// # Errors
    /// Returns a classified `FetchError`; see [`FetchErrorKind`].
    pub async fn fetch(&self, src: &str, base_dir: &Path) -> Result<String, FetchError> {
        match script::classify(src) {
            ScriptSource::Relative => read_local(&base_dir.join(src)).await,
            ScriptSource::Absolute => read_local(Path::new(src)).await,
            ScriptSource::Remote => self.fetch_remote(src).await,
        }
    }

    async fn fetch_remote(&self, src: &str) -> Result<String, FetchError> {
        let url = parse_remote_url(src)?;
        tracing::debug!(url = %url, "fetching remote script");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::HttpStatus,
                format!("{url} answered HTTP {status}"),
            ));
        }

        response.text().await.map_err(|e| classify_reqwest_error(&e))
    }
}

async fn read_local(path: &Path) -> Result<String, FetchError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(FetchError::new(
            FetchErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )),
        Err(e) => Err(FetchError::new(
            FetchErrorKind::Io,
            format!("Failed to read {}: {e}", path.display()),
        )),
    }
}

/// Parses a remote `src`, defaulting protocol-relative references to https.
fn parse_remote_url(src: &str) -> Result<Url, FetchError> {
    let src = src.trim();
    let normalized = if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src.to_string()
    };

    Url::parse(&normalized)
        .map_err(|e| FetchError::new(FetchErrorKind::InvalidUrl, format!("{src}: {e}")))
}

fn classify_reqwest_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::new(FetchErrorKind::Timeout, format!("Request timed out: {e}"))
    } else {
        FetchError::new(FetchErrorKind::Network, format!("Request failed: {e}"))
    }
}
