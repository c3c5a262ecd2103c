//! CLI-specific error types and mappings.
//!
//! Maps `DownloadError` kinds onto sysexits-style exit codes.

use ariafetch_core::{DownloadError, PathError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Download failure with no more specific exit code.
    #[error("{0}")]
    Download(String),

    /// Argument or URL validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The requested backend cannot run here.
    #[error("{0}")]
    Unavailable(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// The server wants credentials.
    #[error("{0}")]
    Authentication(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 69: `EX_UNAVAILABLE`
    /// - 74: `EX_IOERR`
    /// - 77: `EX_NOPERM`
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Download(_) => 1,
            Self::Arguments(_) => 2,
            Self::Unavailable(_) => 69,
            Self::Io(_) => 74,
            Self::Authentication(_) => 77,
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        let message = err.user_message();
        match err {
            DownloadError::InvalidRequest { .. } => Self::Arguments(message),
            DownloadError::BackendUnavailable { .. } | DownloadError::ExecutableNotFound { .. } => {
                Self::Unavailable(message)
            }
            DownloadError::Io { .. } => Self::Io(message),
            DownloadError::AuthenticationRequired { .. } => Self::Authentication(message),
            _ => Self::Download(message),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error bubbled up to `main`.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_errors_map_to_exit_codes() {
        let cases = [
            (DownloadError::invalid_request("bad url"), 2),
            (DownloadError::backend_unavailable("aria2c missing"), 69),
            (DownloadError::executable_not_found("/opt/aria2c"), 69),
            (DownloadError::io("StorageFull", "disk full"), 74),
            (DownloadError::auth_required("api.github.com", Some(401)), 77),
            (DownloadError::non_zero_exit(Some(6)), 1),
            (DownloadError::Cancelled, 1),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err.clone()).exit_code(), code, "{err:?}");
        }
    }

    #[test]
    fn test_anyhow_wrapping_keeps_exit_code() {
        let err = anyhow::Error::new(CliError::Authentication("nope".into()));
        assert_eq!(exit_code_for(&err), 77);

        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }
}
