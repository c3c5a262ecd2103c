//! Resolved targets and terminal download outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::DownloadError;

/// Where a request's bytes will land.
///
/// Frozen once the resolver produces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub source_url: Url,
    pub output_path: PathBuf,
    /// Whether an existing file at `output_path` is replaced.
    pub overwrite: bool,
}

impl ResolvedTarget {
    pub fn new(source_url: Url, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url,
            output_path: output_path.into(),
            overwrite: true,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Output directory, i.e. the parent of `output_path`.
    pub fn directory(&self) -> &Path {
        self.output_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Leaf file name of `output_path`.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The backend that carried out an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// aria2c multi-connection engine.
    Accelerated,
    /// Background HTTP transfer.
    Native,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accelerated => write!(f, "accelerated"),
            Self::Native => write!(f, "native"),
        }
    }
}

/// A failed attempt kept for context when a later attempt also fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub backend: BackendKind,
    pub error: DownloadError,
}

/// Terminal result for one URL.
///
/// `success == true` implies `target.output_path` exists and is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub target: ResolvedTarget,
    pub success: bool,
    pub bytes_transferred: u64,
    /// Backend of the last attempt, `None` if no attempt was made.
    pub backend_used: Option<BackendKind>,
    /// Last observed error for failed outcomes.
    pub error: Option<DownloadError>,
    /// Earlier failed attempts, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_attempts: Vec<AttemptFailure>,
}

impl DownloadOutcome {
    pub const fn succeeded(target: ResolvedTarget, backend: BackendKind, bytes: u64) -> Self {
        Self {
            target,
            success: true,
            bytes_transferred: bytes,
            backend_used: Some(backend),
            error: None,
            previous_attempts: Vec::new(),
        }
    }

    pub const fn failed(
        target: ResolvedTarget,
        backend: Option<BackendKind>,
        error: DownloadError,
    ) -> Self {
        Self {
            target,
            success: false,
            bytes_transferred: 0,
            backend_used: backend,
            error: Some(error),
            previous_attempts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_previous_attempts(mut self, attempts: Vec<AttemptFailure>) -> Self {
        self.previous_attempts = attempts;
        self
    }

    /// Turn the outcome into the single-URL convenience result.
    pub fn into_result(self) -> Result<PathBuf, DownloadError> {
        if self.success {
            Ok(self.target.output_path)
        } else {
            let path = self.target.output_path.display().to_string();
            Err(self
                .error
                .unwrap_or_else(|| DownloadError::output_missing(path)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ResolvedTarget {
        ResolvedTarget::new(
            Url::parse("https://example.com/archive.zip").unwrap(),
            "/downloads/archive.zip",
        )
    }

    #[test]
    fn test_target_accessors() {
        let t = target();
        assert_eq!(t.file_name(), "archive.zip");
        assert_eq!(t.directory(), Path::new("/downloads"));
        assert!(t.overwrite);
    }

    #[test]
    fn test_into_result() {
        let ok = DownloadOutcome::succeeded(target(), BackendKind::Native, 10);
        assert_eq!(ok.into_result().unwrap(), PathBuf::from("/downloads/archive.zip"));

        let err = DownloadOutcome::failed(
            target(),
            Some(BackendKind::Accelerated),
            DownloadError::non_zero_exit(Some(3)),
        );
        assert_eq!(
            err.into_result().unwrap_err(),
            DownloadError::non_zero_exit(Some(3))
        );
    }
}
