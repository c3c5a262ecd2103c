//! Background HTTP transfer service.
//!
//! A portable stand-in for an OS transfer service: each submitted job runs
//! as a tokio task that streams the response into a staging file next to
//! the destination. Callers poll `state`, then `complete` to commit the
//! staging file onto the destination path.
//!
//! # Design
//!
//! - Each job publishes its state on a `watch` channel; `state` reads the
//!   latest value without blocking the transfer
//! - The destination is never written directly, so a failed or cancelled
//!   job leaves no partial file at the output path

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ariafetch_core::{
    DownloadError, DownloadResult, NativeTransferPort, TransferJob, TransferJobId, TransferState,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Suffix of the staging file written next to the destination.
pub const STAGING_SUFFIX: &str = ".ariafetch-part";

/// Staging path for a destination.
pub fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(STAGING_SUFFIX);
    destination.with_file_name(name)
}

struct JobEntry {
    state: watch::Receiver<TransferState>,
    handle: JoinHandle<()>,
    staging: PathBuf,
    destination: PathBuf,
}

/// `NativeTransferPort` implementation over reqwest.
#[derive(Clone)]
pub struct HttpTransferService {
    client: reqwest::Client,
    jobs: Arc<Mutex<HashMap<TransferJobId, JobEntry>>>,
}

impl HttpTransferService {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn take_job(&self, id: TransferJobId) -> DownloadResult<JobEntry> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or_else(|| unknown_job(id))
    }

    /// Number of jobs not yet completed or cancelled.
    pub fn active_jobs(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn unknown_job(id: TransferJobId) -> DownloadError {
    DownloadError::invalid_request(format!("unknown transfer job {id}"))
}

struct TransferFailure {
    message: String,
    status_code: Option<u16>,
}

impl From<std::io::Error> for TransferFailure {
    fn from(err: std::io::Error) -> Self {
        Self {
            message: err.to_string(),
            status_code: None,
        }
    }
}

impl From<reqwest::Error> for TransferFailure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status_code: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

async fn transfer(
    client: &reqwest::Client,
    job: &TransferJob,
    staging: &Path,
    tx: &watch::Sender<TransferState>,
) -> Result<u64, TransferFailure> {
    let mut request = client.get(job.source.clone());
    for (name, value) in &job.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransferFailure {
            message: format!("server responded with HTTP {status}"),
            status_code: Some(status.as_u16()),
        });
    }

    let total = response.content_length();
    tx.send_replace(TransferState::Transferring { bytes: 0, total });

    let mut file = tokio::fs::File::create(staging).await?;
    let mut bytes: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        bytes += chunk.len() as u64;
        tx.send_replace(TransferState::Transferring { bytes, total });
    }
    file.flush().await?;
    file.sync_all().await?;

    Ok(bytes)
}

#[async_trait]
impl NativeTransferPort for HttpTransferService {
    async fn submit(&self, job: TransferJob) -> DownloadResult<TransferJobId> {
        let id = TransferJobId::new();
        let staging = staging_path(&job.destination);
        let destination = job.destination.clone();
        let (tx, rx) = watch::channel(TransferState::Connecting);

        debug!(%id, job = ?job, "Submitting native transfer");

        let client = self.client.clone();
        let task_staging = staging.clone();
        let handle = tokio::spawn(async move {
            let final_state = match transfer(&client, &job, &task_staging, &tx).await {
                Ok(bytes) => TransferState::Transferred { bytes },
                Err(failure) => TransferState::Error {
                    message: failure.message,
                    status_code: failure.status_code,
                },
            };
            tx.send_replace(final_state);
        });

        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).insert(
            id,
            JobEntry {
                state: rx,
                handle,
                staging,
                destination,
            },
        );
        Ok(id)
    }

    async fn state(&self, id: TransferJobId) -> DownloadResult<TransferState> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = jobs.get(&id).ok_or_else(|| unknown_job(id))?;
        let state = entry.state.borrow().clone();
        Ok(state)
    }

    async fn complete(&self, id: TransferJobId) -> DownloadResult<u64> {
        let entry = self.take_job(id)?;
        let state = entry.state.borrow().clone();
        let TransferState::Transferred { bytes } = state else {
            entry.handle.abort();
            let _ = tokio::fs::remove_file(&entry.staging).await;
            return Err(DownloadError::native_transfer(
                format!("job {id} completed before reaching Transferred ({state:?})"),
                None,
            ));
        };

        if tokio::fs::try_exists(&entry.destination).await.unwrap_or(false) {
            tokio::fs::remove_file(&entry.destination).await?;
        }
        tokio::fs::rename(&entry.staging, &entry.destination).await?;
        debug!(%id, bytes, path = %entry.destination.display(), "Committed native transfer");
        Ok(bytes)
    }

    async fn cancel(&self, id: TransferJobId) -> DownloadResult<()> {
        let entry = self.take_job(id)?;
        entry.handle.abort();
        // Let the aborted task drop its file handle before deleting.
        let _ = entry.handle.await;
        if let Err(e) = tokio::fs::remove_file(&entry.staging).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %entry.staging.display(), error = %e, "Could not remove staging file");
            }
        }
        Ok(())
    }
}
