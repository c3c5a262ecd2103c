//! Graceful shutdown of a supervised `tokio::process::Child`.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::timeout;

/// Time a child gets to exit after SIGTERM before it is killed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Stop a child with SIGTERM, escalating to SIGKILL after `grace`.
///
/// aria2 flushes its `.aria2` control file on SIGTERM, so the graceful
/// phase keeps a later `--continue=true` attempt resumable.
///
/// # Platform behavior
/// - Unix: SIGTERM via nix, then `Child::kill` (SIGKILL)
/// - Windows: `Child::kill` immediately
///
/// Always reaps the child before returning.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        let Some(pid) = child.id() else {
            // Already reaped
            return child.wait().await;
        };
        let pid = i32::try_from(pid).map_err(io::Error::other)?;

        if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
            if e == nix::errno::Errno::ESRCH {
                return child.wait().await;
            }
            return Err(io::Error::other(e));
        }

        if let Ok(result) = timeout(grace, child.wait()).await {
            return result;
        }
        tracing::debug!(pid, "Child ignored SIGTERM, sending SIGKILL");
    }

    #[cfg(not(unix))]
    let _ = grace;

    child.kill().await?;
    child.wait().await
}
