//! Error types for runtime operations.
//!
//! Keeps process, RPC and installer plumbing out of the engines. Every
//! variant converts into the shared `DownloadError` taxonomy.

use std::path::PathBuf;

use ariafetch_core::{DownloadError, PathError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    // === Installation & Detection ===
    /// aria2c could not be found anywhere.
    #[error("aria2c not found (searched {searched})")]
    NotInstalled { searched: String },

    /// Pre-built binaries not available for this platform.
    #[error("Pre-built aria2 not available: {reason}")]
    PrebuiltNotAvailable { reason: String },

    /// Failed to download the release archive.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Failed to extract the archive.
    #[error("Failed to extract archive: {0}")]
    ExtractionFailed(String),

    // === Process ===
    /// The process could not be spawned.
    #[error("Failed to spawn {path}: {source}")]
    SpawnFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No free loopback port could be found.
    #[error("No free loopback port available")]
    NoFreePort,

    // === RPC ===
    /// The RPC daemon did not answer in time.
    #[error("aria2 RPC daemon did not become ready within {0:?}")]
    DaemonNotReady(std::time::Duration),

    /// The RPC transport failed.
    #[error("RPC transport error: {0}")]
    RpcTransport(String),

    /// aria2 returned a JSON-RPC error object.
    #[error("aria2 error {code}: {message}")]
    RpcFault { code: i64, message: String },

    /// The RPC response could not be decoded.
    #[error("Malformed RPC response: {0}")]
    RpcDecode(String),

    /// The HTTP client could not be configured.
    #[error("HTTP client configuration error: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RuntimeError> for DownloadError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::NotInstalled { searched } => Self::executable_not_found(searched),
            RuntimeError::PrebuiltNotAvailable { reason } => Self::install_failed(reason),
            RuntimeError::DownloadFailed(msg) | RuntimeError::ExtractionFailed(msg) => {
                Self::install_failed(msg)
            }
            RuntimeError::SpawnFailed { path, source } => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    Self::executable_not_found(path.display().to_string())
                } else {
                    Self::io(format!("{:?}", source.kind()), format!("{}: {source}", path.display()))
                }
            }
            err @ (RuntimeError::NoFreePort
            | RuntimeError::DaemonNotReady(_)
            | RuntimeError::RpcTransport(_)
            | RuntimeError::RpcFault { .. }
            | RuntimeError::RpcDecode(_)) => Self::rpc(err.to_string()),
            RuntimeError::HttpClient(msg) => Self::network(msg),
            RuntimeError::Path(e) => e.into(),
            RuntimeError::Io(e) => Self::from_io_error(&e),
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
