//! aria2c jobs on a long-lived JSON-RPC daemon.
//!
//! One job is in flight per call. The job is polled with
//! `aria2.tellStatus` until it completes or fails. When the caller gives up
//! the job is force-removed so the daemon stops writing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ariafetch_core::{DownloadError, DownloadResult, DownloadSettings};
use ariafetch_runtime::{Aria2Daemon, Aria2JobState, Aria2RpcClient, Aria2Status};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::AcceleratedEngine;
use super::args::rpc_job_options;
use super::failure::classify_failure;
use crate::attempt::Attempt;
use crate::options::sleep_until_deadline;
use crate::output::verify_output;

/// Source of a connected RPC client.
#[async_trait]
pub trait RpcSession: Send + Sync {
    /// A client for a daemon running `executable`, starting one if needed.
    async fn client(&self, executable: &Path) -> DownloadResult<Arc<Aria2RpcClient>>;

    async fn shutdown(&self) -> DownloadResult<()>;
}

#[async_trait]
impl RpcSession for Aria2Daemon {
    async fn client(&self, executable: &Path) -> DownloadResult<Arc<Aria2RpcClient>> {
        Ok(self.ensure_started(executable).await?)
    }

    async fn shutdown(&self) -> DownloadResult<()> {
        Ok(Self::shutdown(self).await?)
    }
}

/// Submits each attempt as a job on a shared aria2c daemon.
pub struct RpcEngine {
    settings: Arc<DownloadSettings>,
    session: Arc<dyn RpcSession>,
}

enum Stop {
    Cancelled,
    TimedOut,
}

impl RpcEngine {
    pub fn new(settings: Arc<DownloadSettings>, session: Arc<dyn RpcSession>) -> Self {
        Self { settings, session }
    }

    async fn abandon(client: &Aria2RpcClient, gid: &str) {
        if let Err(e) = client.force_remove(gid).await {
            warn!(%gid, error = %e, "aria2.forceRemove failed");
        }
        // forceRemove returns before the job reaches `removed`.
        for _ in 0..20 {
            match client.tell_status(gid).await {
                Ok(status) if status.status.is_terminal() => break,
                Ok(_) => tokio::time::sleep(Duration::from_millis(50)).await,
                Err(_) => break,
            }
        }
        Self::forget(client, gid).await;
    }

    /// Drop the job's result entry from the daemon.
    async fn forget(client: &Aria2RpcClient, gid: &str) {
        if let Err(e) = client.remove_download_result(gid).await {
            debug!(%gid, error = %e, "aria2.removeDownloadResult failed");
        }
    }

    async fn wait_for_job(
        &self,
        client: &Aria2RpcClient,
        gid: &str,
        attempt: &Attempt<'_>,
    ) -> DownloadResult<Aria2Status> {
        let deadline = attempt.options.deadline();
        let poll = self.settings.rpc_poll_interval();

        loop {
            let status = client.tell_status(gid).await?;
            attempt
                .options
                .report(status.completed(), status.total());
            if status.status.is_terminal() {
                return Ok(status);
            }

            let stop = tokio::select! {
                () = tokio::time::sleep(poll) => None,
                () = attempt.options.cancel.cancelled() => Some(Stop::Cancelled),
                () = sleep_until_deadline(deadline) => Some(Stop::TimedOut),
            };
            match stop {
                None => {}
                Some(Stop::Cancelled) => {
                    info!(%gid, "Cancelling aria2 job");
                    Self::abandon(client, gid).await;
                    return Err(DownloadError::Cancelled);
                }
                Some(Stop::TimedOut) => {
                    warn!(%gid, "aria2 job timed out");
                    Self::abandon(client, gid).await;
                    return Err(attempt.options.timed_out_error());
                }
            }
        }
    }
}

#[async_trait]
impl AcceleratedEngine for RpcEngine {
    async fn download(&self, executable: &Path, attempt: &Attempt<'_>) -> DownloadResult<u64> {
        let client = self.session.client(executable).await?;
        let options = rpc_job_options(
            &self.settings,
            attempt.request,
            attempt.target,
            attempt.headers.as_map(),
        );

        let gid = client
            .add_uri(&[attempt.target.source_url.to_string()], options)
            .await?;
        info!(
            %gid,
            url = %attempt.target.source_url,
            output = %attempt.target.output_path().display(),
            "Submitted aria2 job"
        );

        let status = self.wait_for_job(&client, &gid, attempt).await?;
        Self::forget(&client, &gid).await;

        match status.status {
            Aria2JobState::Complete => {
                let bytes = verify_output(attempt.target.output_path()).await?;
                debug!(%gid, bytes, "aria2 job complete");
                Ok(bytes)
            }
            Aria2JobState::Removed => Err(DownloadError::Cancelled),
            _ => {
                let message = status.error_message.clone().unwrap_or_default();
                let err = classify_failure(
                    status.error_code(),
                    &message,
                    &attempt.host(),
                    attempt.headers.requires_auth(),
                );
                warn!(%gid, code = ?status.error_code(), %message, "aria2 job failed");
                Err(err)
            }
        }
    }

    async fn shutdown(&self) -> DownloadResult<()> {
        self.session.shutdown().await
    }
}
