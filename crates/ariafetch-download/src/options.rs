//! Per-call options threaded through every engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ariafetch_core::{DownloadError, ProgressUpdate};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-side controls for a download call.
///
/// The accelerator retries forever (`--max-tries=0`), so `timeout` and
/// `cancel` are the only ways a hung transfer ends.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Upper bound on each attempt's wait.
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
    progress: Option<ProgressSink>,
}

impl DownloadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Publish progress on `sender`.
    #[must_use]
    pub fn with_progress(mut self, sender: watch::Sender<ProgressUpdate>) -> Self {
        self.progress = Some(ProgressSink::new(sender));
        self
    }

    /// Publish a progress snapshot, if anyone is listening.
    pub fn report(&self, downloaded: u64, total: Option<u64>) {
        if let Some(sink) = &self.progress {
            sink.publish(downloaded, total);
        }
    }

    /// Deadline for an attempt starting now.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|t| Instant::now() + t)
    }

    pub(crate) fn timed_out_error(&self) -> DownloadError {
        DownloadError::timed_out(self.timeout.map_or(0, |t| t.as_secs()))
    }
}

/// Watch sender plus the sequence counter for its updates.
#[derive(Debug, Clone)]
struct ProgressSink {
    sender: Arc<watch::Sender<ProgressUpdate>>,
    seq: Arc<AtomicU64>,
}

impl ProgressSink {
    fn new(sender: watch::Sender<ProgressUpdate>) -> Self {
        Self {
            sender: Arc::new(sender),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn publish(&self, downloaded: u64, total: Option<u64>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.sender
            .send_replace(ProgressUpdate::new(downloaded, total, seq));
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub(crate) async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
