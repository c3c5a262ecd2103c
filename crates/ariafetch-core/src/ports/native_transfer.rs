//! Native background-transfer port.
//!
//! Models an OS transfer service: a job is submitted asynchronously, its
//! state is polled, and a successful job is finalized with an explicit
//! completion call that commits the file to its destination.
//!
//! # Design
//!
//! - Polling is the only progress channel; there are no callbacks
//! - `complete` is only valid once `state` reports `Transferred`
//! - `cancel` discards partial data

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::errors::DownloadResult;

/// Identifier of a submitted transfer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferJobId(Uuid);

impl TransferJobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransferJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transfer to submit.
#[derive(Clone, PartialEq, Eq)]
pub struct TransferJob {
    pub source: Url,
    pub destination: PathBuf,
    pub headers: BTreeMap<String, String>,
}

impl fmt::Debug for TransferJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferJob")
            .field("source", &self.source.as_str())
            .field("destination", &self.destination)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Observable job state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    Connecting,
    Transferring { bytes: u64, total: Option<u64> },
    Transferred { bytes: u64 },
    Error {
        message: String,
        status_code: Option<u16>,
    },
}

impl TransferState {
    /// `Transferred` and `Error` are terminal.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Transferred { .. } | Self::Error { .. })
    }
}

#[async_trait]
pub trait NativeTransferPort: Send + Sync {
    /// Start a job; returns immediately.
    async fn submit(&self, job: TransferJob) -> DownloadResult<TransferJobId>;

    /// Current state of a job.
    async fn state(&self, id: TransferJobId) -> DownloadResult<TransferState>;

    /// Commit a transferred job to its destination and forget it.
    ///
    /// Returns the committed byte count.
    async fn complete(&self, id: TransferJobId) -> DownloadResult<u64>;

    /// Abort a job and discard partial data.
    async fn cancel(&self, id: TransferJobId) -> DownloadResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TransferState::Connecting.is_terminal());
        assert!(
            !TransferState::Transferring {
                bytes: 1,
                total: None
            }
            .is_terminal()
        );
        assert!(TransferState::Transferred { bytes: 1 }.is_terminal());
        assert!(
            TransferState::Error {
                message: "boom".into(),
                status_code: None
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_job_debug_hides_header_values() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "token s3cr3t".to_string());
        let job = TransferJob {
            source: Url::parse("https://example.com/a").unwrap(),
            destination: PathBuf::from("/tmp/a"),
            headers,
        };
        let rendered = format!("{job:?}");
        assert!(rendered.contains("Authorization"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
