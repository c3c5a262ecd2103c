//! Native fallback downloader.
//!
//! Submits a job to a `NativeTransferPort` and polls its state at a fixed
//! interval until it is `Transferred` or `Error`. Polling is the only
//! concurrency model; the port never calls back.

use std::sync::Arc;
use std::time::Duration;

use ariafetch_core::{
    DownloadError, DownloadResult, NativeTransferPort, TransferJob, TransferJobId, TransferState,
};
use tracing::{debug, info, warn};

use crate::accelerated::failure::is_auth_status;
use crate::attempt::Attempt;
use crate::options::sleep_until_deadline;
use crate::output::verify_output;

/// Downloads through the native transfer service.
pub struct NativeEngine {
    transfers: Arc<dyn NativeTransferPort>,
    poll_interval: Duration,
}

impl NativeEngine {
    pub fn new(transfers: Arc<dyn NativeTransferPort>, poll_interval: Duration) -> Self {
        Self {
            transfers,
            poll_interval,
        }
    }

    async fn discard(&self, id: TransferJobId) {
        if let Err(e) = self.transfers.cancel(id).await {
            debug!(%id, error = %e, "Transfer cleanup failed");
        }
    }

    /// Download `attempt`; returns the byte count.
    pub async fn download(&self, attempt: &Attempt<'_>) -> DownloadResult<u64> {
        let job = TransferJob {
            source: attempt.target.source_url.clone(),
            destination: attempt.target.output_path().to_path_buf(),
            headers: attempt.headers.as_map().clone(),
        };
        let id = self.transfers.submit(job).await?;
        info!(
            %id,
            url = %attempt.target.source_url,
            output = %attempt.target.output_path().display(),
            "Submitted native transfer"
        );

        let deadline = attempt.options.deadline();
        loop {
            match self.transfers.state(id).await? {
                TransferState::Transferred { bytes } => {
                    attempt.options.report(bytes, Some(bytes));
                    break;
                }
                TransferState::Error {
                    message,
                    status_code,
                } => {
                    self.discard(id).await;
                    warn!(%id, ?status_code, %message, "Native transfer failed");
                    return Err(transfer_error(attempt, message, status_code));
                }
                TransferState::Transferring { bytes, total } => {
                    attempt.options.report(bytes, total);
                }
                TransferState::Connecting => {}
            }

            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                () = attempt.options.cancel.cancelled() => {
                    self.discard(id).await;
                    return Err(DownloadError::Cancelled);
                }
                () = sleep_until_deadline(deadline) => {
                    self.discard(id).await;
                    return Err(attempt.options.timed_out_error());
                }
            }
        }

        let committed = self.transfers.complete(id).await?;
        let bytes = verify_output(attempt.target.output_path()).await?;
        debug!(%id, committed, bytes, "Native transfer committed");
        Ok(bytes)
    }
}

fn transfer_error(attempt: &Attempt<'_>, message: String, status_code: Option<u16>) -> DownloadError {
    match status_code {
        Some(status) if is_auth_status(status, attempt.headers.requires_auth()) => {
            DownloadError::auth_required(attempt.host(), Some(status))
        }
        _ => DownloadError::native_transfer(message, status_code),
    }
}
