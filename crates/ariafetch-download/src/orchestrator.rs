//! Per-URL download pipeline and batch driver.
//!
//! For each URL: build headers → resolve the file name → ensure the
//! destination directory → select a backend → remove stale output →
//! attempt → (under `Auto`) retry once through the native engine.
//!
//! # Design
//!
//! - URLs run one at a time and outcomes keep input order; callers wanting
//!   parallelism run several orchestrator calls themselves
//! - A failing URL never aborts the batch; its outcome carries the error
//! - Authentication failures and cancellation are never retried

use std::path::PathBuf;
use std::sync::Arc;

use ariafetch_core::{
    AttemptFailure, BackendKind, DirectoryCreationStrategy, DownloadError, DownloadOutcome,
    DownloadRequest, DownloadResult, ResolvedTarget, UrlSource, ensure_directory,
};
use tracing::{info, warn};

use crate::accelerated::AcceleratedEngine;
use crate::attempt::Attempt;
use crate::auth::RepoAuthenticator;
use crate::native::NativeEngine;
use crate::options::DownloadOptions;
use crate::output::remove_stale_output;
use crate::resolver::FilenameResolver;
use crate::selector::{BackendSelector, SelectedBackend};

/// Result of a `download_source` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadReport {
    /// The source held one URL and it succeeded.
    Single(PathBuf),
    /// Per-URL outcomes, in input order.
    Batch(Vec<DownloadOutcome>),
}

/// Drives downloads through the resolver, selector and engines.
pub struct Orchestrator {
    resolver: FilenameResolver,
    selector: BackendSelector,
    authenticator: RepoAuthenticator,
    accelerated: Arc<dyn AcceleratedEngine>,
    native: NativeEngine,
}

impl Orchestrator {
    pub fn new(
        resolver: FilenameResolver,
        selector: BackendSelector,
        authenticator: RepoAuthenticator,
        accelerated: Arc<dyn AcceleratedEngine>,
        native: NativeEngine,
    ) -> Self {
        Self {
            resolver,
            selector,
            authenticator,
            accelerated,
            native,
        }
    }

    /// Download every request in order.
    pub async fn download_all(
        &self,
        requests: &[DownloadRequest],
        options: &DownloadOptions,
    ) -> Vec<DownloadOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            if options.cancel.is_cancelled() {
                // Later URLs are reported, not silently dropped.
                outcomes.push(DownloadOutcome::failed(
                    unresolved_target(request),
                    None,
                    DownloadError::Cancelled,
                ));
                continue;
            }
            info!(
                item = index + 1,
                total = requests.len(),
                url = %request.source_url(),
                "Downloading"
            );
            outcomes.push(self.download(request, options).await);
        }
        outcomes
    }

    /// Single-URL convenience: the output path, or the outcome's error.
    pub async fn download_file(
        &self,
        request: &DownloadRequest,
        options: &DownloadOptions,
    ) -> DownloadResult<PathBuf> {
        self.download(request, options).await.into_result()
    }

    /// Load `source` and download each URL with `template`'s options.
    ///
    /// A source with one URL yields `Single` (or that URL's error); more
    /// yield `Batch`.
    pub async fn download_source(
        &self,
        source: &UrlSource,
        template: &DownloadRequest,
        options: &DownloadOptions,
    ) -> DownloadResult<DownloadReport> {
        let requests = source
            .load()?
            .into_iter()
            .map(|url| template.retarget(url))
            .collect::<DownloadResult<Vec<_>>>()?;

        if let [request] = requests.as_slice() {
            return self
                .download_file(request, options)
                .await
                .map(DownloadReport::Single);
        }
        Ok(DownloadReport::Batch(
            self.download_all(&requests, options).await,
        ))
    }

    /// Download one URL. Every failure ends up in the outcome.
    pub async fn download(
        &self,
        request: &DownloadRequest,
        options: &DownloadOptions,
    ) -> DownloadOutcome {
        let headers = self.authenticator.headers_for(request).await;
        let name = match self
            .resolver
            .resolve(request.source_url(), headers.as_map(), options)
            .await
        {
            Ok(name) => name,
            Err(e) => return DownloadOutcome::failed(unresolved_target(request), None, e),
        };
        let target = ResolvedTarget::new(
            request.source_url().clone(),
            request.destination_dir().join(name),
        );

        if let Err(e) = ensure_directory(
            request.destination_dir(),
            DirectoryCreationStrategy::AutoCreate,
        ) {
            return DownloadOutcome::failed(target, None, e.into());
        }

        let backend = match self.selector.select(request.preference()).await {
            Ok(backend) => backend,
            Err(e) => {
                warn!(url = %request.source_url(), error = %e, "No usable backend");
                return DownloadOutcome::failed(target, None, e);
            }
        };

        let attempt = Attempt {
            request,
            target: &target,
            headers: &headers,
            options,
        };
        let kind = backend.kind();
        let first = self.run_attempt(&backend, &attempt).await;

        let error = match first {
            Ok(bytes) => return success(&target, kind, bytes, Vec::new()),
            Err(e) => e,
        };

        if kind == BackendKind::Native
            || !request.preference().allows_fallback()
            || !error.is_retryable()
        {
            return failure(&target, kind, error, Vec::new());
        }

        warn!(
            url = %request.source_url(),
            error = %error,
            "Accelerated attempt failed, retrying with native transfer"
        );
        if matches!(error, DownloadError::ExecutableNotFound { .. }) {
            self.selector.invalidate();
        }
        let previous = vec![AttemptFailure {
            backend: kind,
            error,
        }];

        match self.run_attempt(&SelectedBackend::Native, &attempt).await {
            Ok(bytes) => success(&target, BackendKind::Native, bytes, previous),
            Err(e) => failure(&target, BackendKind::Native, e, previous),
        }
    }

    async fn run_attempt(
        &self,
        backend: &SelectedBackend,
        attempt: &Attempt<'_>,
    ) -> DownloadResult<u64> {
        remove_stale_output(attempt.target.output_path()).await?;
        match backend {
            SelectedBackend::Accelerated(executable) => {
                self.accelerated.download(executable, attempt).await
            }
            SelectedBackend::Native => self.native.download(attempt).await,
        }
    }

    /// Stop long-lived backend processes.
    pub async fn shutdown(&self) -> DownloadResult<()> {
        self.accelerated.shutdown().await
    }
}

/// Target recorded for a URL that was never resolved.
fn unresolved_target(request: &DownloadRequest) -> ResolvedTarget {
    ResolvedTarget::new(
        request.source_url().clone(),
        request.destination_dir().to_path_buf(),
    )
}

fn success(
    target: &ResolvedTarget,
    backend: BackendKind,
    bytes: u64,
    previous: Vec<AttemptFailure>,
) -> DownloadOutcome {
    info!(
        path = %target.output_path().display(),
        bytes,
        %backend,
        "Download complete"
    );
    DownloadOutcome::succeeded(target.clone(), backend, bytes).with_previous_attempts(previous)
}

fn failure(
    target: &ResolvedTarget,
    backend: BackendKind,
    error: DownloadError,
    previous: Vec<AttemptFailure>,
) -> DownloadOutcome {
    warn!(
        url = %target.source_url,
        %backend,
        error = %error,
        "Download failed"
    );
    DownloadOutcome::failed(target.clone(), Some(backend), error).with_previous_attempts(previous)
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}
