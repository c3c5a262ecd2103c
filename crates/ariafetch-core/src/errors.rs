//! Download error types.
//!
//! These errors are serializable and do not depend on external error types
//! like `std::io::Error`. For I/O errors, we capture the kind and message as
//! strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy for every download backend.
///
/// Callers branch on the variant to decide between retrying, falling back to
/// another backend, or prompting the user for credentials.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// The accelerator executable could not be located.
    #[error("Executable not found: {path}")]
    ExecutableNotFound {
        /// Path (or program name) that was searched for.
        path: String,
    },

    /// The requested backend cannot be used and fallback is not allowed.
    #[error("Backend unavailable: {reason}")]
    BackendUnavailable {
        /// Why the backend could not be selected.
        reason: String,
    },

    /// The accelerator process exited with a non-zero status.
    #[error("Process exited with code {code:?}")]
    ProcessNonZeroExit {
        /// Exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
    },

    /// The backend reported success but the output file is missing or empty.
    #[error("Output missing or empty: {path}")]
    OutputMissingOrEmpty {
        /// Expected output path.
        path: String,
    },

    /// The remote host rejected the request for lack of credentials.
    #[error("Authentication required for {host}")]
    AuthenticationRequired {
        /// Host that refused the transfer.
        host: String,
        /// HTTP status if it was observed (401, 403 or 404).
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// No output name could be derived. Absorbed by the resolver, which
    /// falls back to a synthesized name.
    #[error("Filename resolution failed: {message}")]
    FilenameResolutionFailed {
        /// Detailed error message.
        message: String,
    },

    /// The native transfer job ended in its error state.
    #[error("Native transfer failed: {message}")]
    NativeTransferError {
        /// Error reported by the transfer job.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The request was rejected before any work started.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "`NotFound`", "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// Network/HTTP error outside of a transfer job.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The accelerator's RPC control channel failed.
    #[error("RPC error: {message}")]
    Rpc {
        /// Detailed error message.
        message: String,
    },

    /// Fetching or extracting the pinned accelerator release failed.
    #[error("Install failed: {message}")]
    InstallFailed {
        /// Detailed error message.
        message: String,
    },

    /// The caller-supplied timeout elapsed.
    #[error("Timed out after {seconds}s")]
    TimedOut {
        /// Timeout that elapsed, in seconds.
        seconds: u64,
    },

    /// The caller cancelled the download.
    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Create an executable-not-found error.
    pub fn executable_not_found(path: impl Into<String>) -> Self {
        Self::ExecutableNotFound { path: path.into() }
    }

    /// Create a backend-unavailable error.
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a non-zero exit error.
    #[must_use]
    pub const fn non_zero_exit(code: Option<i32>) -> Self {
        Self::ProcessNonZeroExit { code }
    }

    /// Create an output-missing error for the given path.
    pub fn output_missing(path: impl Into<String>) -> Self {
        Self::OutputMissingOrEmpty { path: path.into() }
    }

    /// Create an authentication-required error.
    pub fn auth_required(host: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::AuthenticationRequired {
            host: host.into(),
            status_code,
        }
    }

    /// Create a filename resolution error.
    pub fn filename_resolution(message: impl Into<String>) -> Self {
        Self::FilenameResolutionFailed {
            message: message.into(),
        }
    }

    /// Create a native transfer error.
    pub fn native_transfer(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::NativeTransferError {
            message: message.into(),
            status_code,
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an I/O error from kind and message strings.
    pub fn io(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    ///
    /// This captures the error kind name and message for serialization.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an RPC error.
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            message: message.into(),
        }
    }

    /// Create an install error.
    pub fn install_failed(message: impl Into<String>) -> Self {
        Self::InstallFailed {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub const fn timed_out(seconds: u64) -> Self {
        Self::TimedOut { seconds }
    }

    /// Whether another attempt (or the native fallback) may succeed.
    ///
    /// Credential, cancellation and request-shape failures never improve on
    /// retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AuthenticationRequired { .. }
                | Self::Cancelled
                | Self::InvalidRequest { .. }
                | Self::BackendUnavailable { .. }
        )
    }

    /// Check if this is an authentication failure.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationRequired { .. })
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ExecutableNotFound { path } => {
                format!("aria2c was not found ({path}). Run `ariafetch install-aria2` or use --backend native.")
            }
            Self::BackendUnavailable { reason } => format!("Backend unavailable: {reason}"),
            Self::ProcessNonZeroExit { code: Some(code) } => {
                format!("aria2c exited with code {code}. See the attempt log for details.")
            }
            Self::ProcessNonZeroExit { code: None } => {
                "aria2c was terminated by a signal.".to_string()
            }
            Self::OutputMissingOrEmpty { path } => {
                format!("The download finished but {path} is missing or empty.")
            }
            Self::AuthenticationRequired {
                host,
                status_code: Some(code),
            } => format!("{host} refused the request (HTTP {code}). Configure a token and retry."),
            Self::AuthenticationRequired { host, .. } => {
                format!("{host} requires authentication. Configure a token and retry.")
            }
            Self::FilenameResolutionFailed { message } => {
                format!("Could not determine a file name: {message}")
            }
            Self::NativeTransferError { message, .. } => format!("Transfer failed: {message}"),
            Self::InvalidRequest { message } => format!("Invalid request: {message}"),
            Self::Io { message, .. } => format!("File operation failed: {message}"),
            Self::Network {
                message,
                status_code: Some(code),
            } => format!("Network error (HTTP {code}): {message}"),
            Self::Network { message, .. } => format!("Network error: {message}"),
            Self::Rpc { message } => format!("aria2 RPC error: {message}"),
            Self::InstallFailed { message } => format!("Could not install aria2: {message}"),
            Self::TimedOut { seconds } => format!("Download timed out after {seconds} seconds."),
            Self::Cancelled => "Download was cancelled.".to_string(),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;
