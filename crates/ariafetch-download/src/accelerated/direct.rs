//! One aria2c process per file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ariafetch_core::{
    BackendInvocation, DownloadError, DownloadResult, DownloadSettings, InterfaceProbe,
    TimeoutPolicy,
};
use ariafetch_runtime::{ProcessExit, run_invocation};
use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AcceleratedEngine;
use super::args::command_line;
use super::failure::classify_failure;
use crate::attempt::Attempt;
use crate::output::verify_output;

/// Spawns aria2c for each attempt and waits for it to exit.
pub struct DirectEngine {
    settings: Arc<DownloadSettings>,
    interfaces: Arc<dyn InterfaceProbe>,
    log_dir: Option<PathBuf>,
}

impl DirectEngine {
    pub fn new(settings: Arc<DownloadSettings>, interfaces: Arc<dyn InterfaceProbe>) -> Self {
        Self {
            settings,
            interfaces,
            log_dir: None,
        }
    }

    /// Write each attempt's console output to a fresh file in `dir`.
    ///
    /// Without a log directory, authentication failures are only detected
    /// from aria2's exit code.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    fn attempt_log_file(&self) -> Option<PathBuf> {
        let dir = self.log_dir.as_ref()?;
        let id = Uuid::new_v4().simple().to_string();
        Some(dir.join(format!(
            "aria2-{}-{}.log",
            Local::now().format("%Y%m%d-%H%M%S"),
            &id[..8]
        )))
    }

    fn invocation(&self, executable: &Path, attempt: &Attempt<'_>) -> BackendInvocation {
        let interfaces = if self.settings.use_multiple_interfaces {
            self.interfaces.bindable_ipv4()
        } else {
            Vec::new()
        };
        let arguments = command_line(
            &self.settings,
            attempt.request,
            attempt.target,
            attempt.headers.as_map(),
            &interfaces,
        );

        let invocation = BackendInvocation::new(executable, attempt.target.directory())
            .with_arguments(arguments)
            .with_timeout(TimeoutPolicy::from_option(attempt.options.timeout));
        match self.attempt_log_file() {
            Some(log) => invocation.with_log_file(log),
            None => invocation,
        }
    }
}

async fn read_log(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return String::new();
    };
    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read aria2 log");
            String::new()
        }
    }
}

#[async_trait]
impl AcceleratedEngine for DirectEngine {
    async fn download(&self, executable: &Path, attempt: &Attempt<'_>) -> DownloadResult<u64> {
        let invocation = self.invocation(executable, attempt);
        let output = attempt.target.output_path();
        info!(
            url = %attempt.target.source_url,
            output = %output.display(),
            "Starting aria2c"
        );

        match run_invocation(&invocation, &attempt.options.cancel).await? {
            ProcessExit::Exited(Some(0)) => {
                let bytes = verify_output(output).await?;
                attempt.options.report(bytes, Some(bytes));
                debug!(bytes, "aria2c finished");
                Ok(bytes)
            }
            ProcessExit::Exited(code) => {
                let log = read_log(invocation.log_file()).await;
                let err = classify_failure(
                    code,
                    &log,
                    &attempt.host(),
                    attempt.headers.requires_auth(),
                );
                warn!(?code, log = ?invocation.log_file(), error = %err, "aria2c failed");
                Err(err)
            }
            ProcessExit::TimedOut(_) => Err(attempt.options.timed_out_error()),
            ProcessExit::Cancelled => Err(DownloadError::Cancelled),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::auth::AttemptHeaders;
    use crate::options::DownloadOptions;
    use ariafetch_core::{DownloadRequest, NoInterfaces, ResolvedTarget};
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("aria2c");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    struct Fixture {
        _tmp: TempDir,
        bin: PathBuf,
        out_dir: PathBuf,
        log_dir: PathBuf,
        request: DownloadRequest,
        target: ResolvedTarget,
    }

    fn fixture(body: &str) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let bin_dir = tmp.path().join("bin");
        let out_dir = tmp.path().join("out");
        std::fs::create_dir_all(&bin_dir).unwrap();
        std::fs::create_dir_all(&out_dir).unwrap();
        let url = Url::parse("https://example.com/archive.zip").unwrap();
        Fixture {
            bin: script(&bin_dir, body),
            log_dir: tmp.path().join("logs"),
            request: DownloadRequest::new(url.clone(), &out_dir).unwrap(),
            target: ResolvedTarget::new(url, out_dir.join("archive.zip")),
            out_dir,
            _tmp: tmp,
        }
    }

    fn engine(f: &Fixture) -> DirectEngine {
        DirectEngine::new(Arc::new(DownloadSettings::default()), Arc::new(NoInterfaces))
            .with_log_dir(&f.log_dir)
    }

    async fn run(f: &Fixture, options: &DownloadOptions) -> DownloadResult<u64> {
        let headers = AttemptHeaders::default();
        let attempt = Attempt {
            request: &f.request,
            target: &f.target,
            headers: &headers,
            options,
        };
        engine(f).download(&f.bin, &attempt).await
    }

    #[tokio::test]
    async fn test_success_writes_out_file() {
        // Writes the --out file inside --dir, like aria2c
        let f = fixture(
            r#"for a in "$@"; do case "$a" in --dir=*) d="${a#--dir=}";; --out=*) o="${a#--out=}";; esac; done
printf 'payload' > "$d/$o""#,
        );
        let bytes = run(&f, &DownloadOptions::new()).await.unwrap();
        assert_eq!(bytes, 7);
        assert_eq!(std::fs::read(f.out_dir.join("archive.zip")).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_zero_exit_without_file_is_failure() {
        let f = fixture("exit 0");
        let err = run(&f, &DownloadOptions::new()).await.unwrap_err();
        assert!(matches!(err, DownloadError::OutputMissingOrEmpty { .. }));
    }

    #[tokio::test]
    async fn test_403_log_is_auth_failure() {
        let f = fixture(
            "echo 'errorCode=22 The response status is not successful. status=403'\nexit 22",
        );
        let err = run(&f, &DownloadOptions::new()).await.unwrap_err();
        assert_eq!(err, DownloadError::auth_required("example.com", Some(403)));
    }

    #[tokio::test]
    async fn test_plain_failure_keeps_exit_code() {
        let f = fixture("echo 'errorCode=6 network problem'\nexit 6");
        let err = run(&f, &DownloadOptions::new()).await.unwrap_err();
        assert_eq!(err, DownloadError::non_zero_exit(Some(6)));
    }

    #[tokio::test]
    async fn test_timeout_terminates_process() {
        let f = fixture("sleep 30");
        let options = DownloadOptions::new().with_timeout(Some(Duration::from_millis(200)));
        let err = run(&f, &options).await.unwrap_err();
        assert!(matches!(err, DownloadError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_cancel_terminates_process() {
        let f = fixture("sleep 30");
        let options = DownloadOptions::new();
        let cancel = options.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        });
        let err = run(&f, &options).await.unwrap_err();
        assert_eq!(err, DownloadError::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let f = fixture("exit 0");
        let headers = AttemptHeaders::default();
        let options = DownloadOptions::new();
        let attempt = Attempt {
            request: &f.request,
            target: &f.target,
            headers: &headers,
            options: &options,
        };
        let err = engine(&f)
            .download(&f.out_dir.join("no-such-aria2c"), &attempt)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ExecutableNotFound { .. }));
    }
}
