//! Download request types.
//!
//! A `DownloadRequest` is validated when it is built and never mutated
//! afterwards; the orchestrator creates one per URL of a batch.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

/// Upper bound on connections per server and split count.
pub const MAX_CONNECTIONS_CEILING: u32 = 16;

/// Which backend the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Use the accelerator when available, otherwise the native path.
    #[default]
    Auto,
    /// Require the accelerator; never fall back.
    Accelerated,
    /// Skip the accelerator entirely.
    Native,
}

impl BackendPreference {
    /// Whether a native retry is allowed after an accelerated failure.
    #[must_use]
    pub const fn allows_fallback(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Accelerated => write!(f, "accelerated"),
            Self::Native => write!(f, "native"),
        }
    }
}

impl FromStr for BackendPreference {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "accelerated" | "aria2" | "aria2c" => Ok(Self::Accelerated),
            "native" | "http" => Ok(Self::Native),
            other => Err(DownloadError::invalid_request(format!(
                "unknown backend '{other}' (expected auto, accelerated or native)"
            ))),
        }
    }
}

/// Log verbosity handed to the accelerator's `--console-log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorLogLevel {
    Debug,
    Info,
    #[default]
    Notice,
    Warn,
    Error,
}

impl AcceleratorLogLevel {
    /// The value aria2 expects for `--console-log-level`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for AcceleratorLogLevel {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "notice" => Ok(Self::Notice),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(DownloadError::invalid_request(format!(
                "unknown log level '{other}'"
            ))),
        }
    }
}

/// Name of a secret held by the secret store. Never the secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef(String);

impl SecretRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse and validate a source URL. Only `http` and `https` with a host are accepted.
pub fn parse_source_url(raw: &str) -> DownloadResult<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| DownloadError::invalid_request(format!("'{trimmed}' is not a URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(DownloadError::invalid_request(format!(
                "unsupported scheme '{scheme}' in '{trimmed}'"
            )));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(DownloadError::invalid_request(format!(
            "'{trimmed}' has no host"
        )));
    }
    Ok(url)
}

/// Where the URLs of a batch come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSource {
    /// URLs given directly.
    ByUrl(Vec<String>),
    /// A text file with one URL per line; blank lines and `#` comments are skipped.
    ByUrlFile(PathBuf),
}

impl UrlSource {
    /// Validate every URL of the source, preserving order.
    pub fn load(&self) -> DownloadResult<Vec<Url>> {
        let urls = match self {
            Self::ByUrl(raw) => raw
                .iter()
                .map(|u| parse_source_url(u))
                .collect::<DownloadResult<Vec<_>>>()?,
            Self::ByUrlFile(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    DownloadError::invalid_request(format!(
                        "cannot read URL file {}: {e}",
                        path.display()
                    ))
                })?;
                let urls = parse_url_list(&contents)?;
                tracing::debug!(path = %path.display(), count = urls.len(), "Loaded URL list");
                urls
            }
        };

        if urls.is_empty() {
            return Err(DownloadError::invalid_request("no URLs to download"));
        }
        Ok(urls)
    }
}

/// Parse a newline-separated URL list.
pub fn parse_url_list(contents: &str) -> DownloadResult<Vec<Url>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            parse_source_url(line).map_err(|e| {
                DownloadError::invalid_request(format!("line {}: {}", idx + 1, e))
            })
        })
        .collect()
}

/// One URL to download, with everything needed to drive any backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    source_url: Url,
    destination_dir: PathBuf,
    preference: BackendPreference,
    headers: BTreeMap<String, String>,
    auth_secret: Option<SecretRef>,
    max_connections: u32,
    log_level: AcceleratorLogLevel,
}

impl DownloadRequest {
    /// Create a request with default options.
    ///
    /// A relative destination is anchored to the current directory here, so
    /// backends that run with another working directory agree on the path.
    pub fn new(source_url: Url, destination_dir: impl Into<PathBuf>) -> DownloadResult<Self> {
        let source_url = parse_source_url(source_url.as_str())?;
        let destination_dir = destination_dir.into();
        if destination_dir.as_os_str().is_empty() {
            return Err(DownloadError::invalid_request(
                "destination directory cannot be empty",
            ));
        }
        let destination_dir =
            std::path::absolute(&destination_dir).map_err(|e| DownloadError::from_io_error(&e))?;

        Ok(Self {
            source_url,
            destination_dir,
            preference: BackendPreference::Auto,
            headers: BTreeMap::new(),
            auth_secret: None,
            max_connections: MAX_CONNECTIONS_CEILING,
            log_level: AcceleratorLogLevel::default(),
        })
    }

    /// Copy of this request for another URL; every other option is kept.
    ///
    /// Batches are built by retargeting one request per line of a URL list.
    pub fn retarget(&self, source_url: Url) -> DownloadResult<Self> {
        Ok(Self {
            source_url: parse_source_url(source_url.as_str())?,
            ..self.clone()
        })
    }

    /// Set the backend preference.
    #[must_use]
    pub const fn with_preference(mut self, preference: BackendPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Add a request header. Later values replace earlier ones for the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace all request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Use the named secret for this request's `Authorization` header.
    #[must_use]
    pub fn with_auth_secret(mut self, secret: SecretRef) -> Self {
        self.auth_secret = Some(secret);
        self
    }

    /// Set the connection count, clamped to `1..=MAX_CONNECTIONS_CEILING`.
    #[must_use]
    pub fn with_max_connections(mut self, connections: u32) -> Self {
        self.max_connections = connections.clamp(1, MAX_CONNECTIONS_CEILING);
        self
    }

    /// Set the accelerator log level.
    #[must_use]
    pub const fn with_log_level(mut self, level: AcceleratorLogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub const fn source_url(&self) -> &Url {
        &self.source_url
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    pub const fn preference(&self) -> BackendPreference {
        self.preference
    }

    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub const fn auth_secret(&self) -> Option<&SecretRef> {
        self.auth_secret.as_ref()
    }

    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub const fn log_level(&self) -> AcceleratorLogLevel {
        self.log_level
    }

    /// Host of the source URL, lower-cased.
    pub fn host(&self) -> String {
        self.source_url
            .host_str()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}
