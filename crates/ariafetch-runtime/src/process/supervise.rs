//! Spawning and supervising a `BackendInvocation`.
//!
//! # Design
//!
//! - Output goes to the invocation's log file, or nowhere; never to the
//!   parent's terminal, so concurrent attempts cannot interleave
//! - The wait races process exit against the timeout policy and the
//!   caller's `CancellationToken`; the loser is shut down gracefully
//! - On Windows the process is started without a console window

use std::fs::File;
use std::process::Stdio;
use std::time::Duration;

use ariafetch_core::BackendInvocation;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::shutdown::{SHUTDOWN_GRACE, shutdown_child};
use crate::error::{RuntimeError, RuntimeResult};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited on its own. `None` when killed by a signal.
    Exited(Option<i32>),
    /// The timeout elapsed and the process was terminated.
    TimedOut(Duration),
    /// The token was cancelled and the process was terminated.
    Cancelled,
}

impl ProcessExit {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Exited(Some(0)))
    }
}

fn output_stdio(invocation: &BackendInvocation) -> RuntimeResult<(Stdio, Stdio)> {
    let Some(path) = invocation.log_file() else {
        return Ok((Stdio::null(), Stdio::null()));
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let stderr = file.try_clone()?;
    Ok((Stdio::from(file), Stdio::from(stderr)))
}

/// Spawn the invocation without waiting for it.
pub fn spawn_invocation(invocation: &BackendInvocation) -> RuntimeResult<Child> {
    let (stdout, stderr) = output_stdio(invocation)?;

    let mut cmd = Command::new(&invocation.executable);
    cmd.args(&invocation.arguments)
        .current_dir(&invocation.working_directory)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    debug!(
        executable = %invocation.executable.display(),
        args = ?invocation.redacted_arguments(),
        "Spawning accelerator"
    );

    cmd.spawn().map_err(|source| RuntimeError::SpawnFailed {
        path: invocation.executable.clone(),
        source,
    })
}

enum Waited {
    Exited(std::io::Result<std::process::ExitStatus>),
    Deadline(Duration),
    Cancelled,
}

/// Run the invocation to completion, honouring its timeout and `cancel`.
pub async fn run_invocation(
    invocation: &BackendInvocation,
    cancel: &CancellationToken,
) -> RuntimeResult<ProcessExit> {
    let mut child = spawn_invocation(invocation)?;
    let timeout = invocation.timeout.duration();

    let deadline = async {
        match timeout {
            Some(d) => {
                tokio::time::sleep(d).await;
                d
            }
            None => std::future::pending().await,
        }
    };

    let waited = tokio::select! {
        status = child.wait() => Waited::Exited(status),
        d = deadline => Waited::Deadline(d),
        () = cancel.cancelled() => Waited::Cancelled,
    };

    match waited {
        Waited::Exited(status) => {
            let status = status?;
            debug!(code = ?status.code(), "Accelerator exited");
            Ok(ProcessExit::Exited(status.code()))
        }
        Waited::Deadline(d) => {
            warn!(timeout = ?d, "Accelerator timed out, terminating");
            shutdown_child(&mut child, SHUTDOWN_GRACE).await?;
            Ok(ProcessExit::TimedOut(d))
        }
        Waited::Cancelled => {
            debug!("Accelerator cancelled, terminating");
            shutdown_child(&mut child, SHUTDOWN_GRACE).await?;
            Ok(ProcessExit::Cancelled)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use ariafetch_core::TimeoutPolicy;
    use tempfile::tempdir;

    fn sh(script: &str, dir: &std::path::Path) -> BackendInvocation {
        BackendInvocation::new("/bin/sh", dir)
            .with_arguments(vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let tmp = tempdir().unwrap();
        let exit = run_invocation(&sh("exit 3", tmp.path()), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(exit, ProcessExit::Exited(Some(3)));
        assert!(!exit.is_success());
    }

    #[tokio::test]
    async fn test_output_goes_to_log_file() {
        let tmp = tempdir().unwrap();
        let log = tmp.path().join("logs").join("attempt.log");
        let inv = sh("echo to-stdout; echo to-stderr >&2", tmp.path()).with_log_file(&log);

        let exit = run_invocation(&inv, &CancellationToken::new()).await.unwrap();
        assert!(exit.is_success());

        let contents = std::fs::read_to_string(&log).unwrap();
        assert!(contents.contains("to-stdout"));
        assert!(contents.contains("to-stderr"));
    }

    #[tokio::test]
    async fn test_timeout_terminates_process() {
        let tmp = tempdir().unwrap();
        let inv = sh("sleep 30", tmp.path())
            .with_timeout(TimeoutPolicy::After(Duration::from_millis(200)));

        let exit = run_invocation(&inv, &CancellationToken::new()).await.unwrap();
        assert_eq!(exit, ProcessExit::TimedOut(Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_cancellation_terminates_process() {
        let tmp = tempdir().unwrap();
        let inv = sh("sleep 30", tmp.path());
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let exit = run_invocation(&inv, &token).await.unwrap();
        assert_eq!(exit, ProcessExit::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let tmp = tempdir().unwrap();
        let inv = BackendInvocation::new(tmp.path().join("no-such-aria2c"), tmp.path());
        let err = run_invocation(&inv, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::SpawnFailed { .. }));
    }
}
