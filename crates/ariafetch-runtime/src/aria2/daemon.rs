//! Long-lived aria2 RPC daemon.
//!
//! One daemon serves every RPC-mode job of its owner. It is started
//! lazily, listens on a random loopback port, and authenticates callers
//! with a random per-process secret.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ariafetch_core::BackendInvocation;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::rpc::Aria2RpcClient;
use crate::error::{RuntimeError, RuntimeResult};
use crate::process::{SHUTDOWN_GRACE, free_loopback_port, shutdown_child, spawn_invocation};

/// Daemon startup options.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// How long to wait for `aria2.getVersion` to answer after spawning.
    pub startup_timeout: Duration,
    /// Where the daemon's console output goes.
    pub log_file: Option<PathBuf>,
    pub working_directory: PathBuf,
    /// Global aria2 options (`--key=value`) that cannot be set per job.
    pub extra_arguments: Vec<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(10),
            log_file: None,
            working_directory: std::env::temp_dir(),
            extra_arguments: Vec::new(),
        }
    }
}

struct RunningDaemon {
    child: Child,
    client: Arc<Aria2RpcClient>,
    executable: PathBuf,
}

/// Lazily started aria2 RPC daemon.
pub struct Aria2Daemon {
    http: reqwest::Client,
    config: DaemonConfig,
    state: Mutex<Option<RunningDaemon>>,
}

impl Aria2Daemon {
    pub fn new(http: reqwest::Client, config: DaemonConfig) -> Self {
        Self {
            http,
            config,
            state: Mutex::new(None),
        }
    }

    /// RPC client for a running daemon, starting one from `executable` if needed.
    ///
    /// A daemon whose process has exited is replaced.
    pub async fn ensure_started(&self, executable: &Path) -> RuntimeResult<Arc<Aria2RpcClient>> {
        let mut state = self.state.lock().await;

        if let Some(running) = state.as_mut() {
            match running.child.try_wait() {
                Ok(None) if running.executable == executable => {
                    return Ok(Arc::clone(&running.client));
                }
                Ok(None) => {
                    debug!("aria2 executable changed, restarting daemon");
                    let _ = shutdown_child(&mut running.child, SHUTDOWN_GRACE).await;
                }
                Ok(Some(status)) => warn!(code = ?status.code(), "aria2 daemon exited, restarting"),
                Err(e) => warn!(error = %e, "Could not poll aria2 daemon, restarting"),
            }
            *state = None;
        }

        let running = self.start(executable).await?;
        let client = Arc::clone(&running.client);
        *state = Some(running);
        Ok(client)
    }

    async fn start(&self, executable: &Path) -> RuntimeResult<RunningDaemon> {
        let port = free_loopback_port()?;
        let secret = Uuid::new_v4().simple().to_string();

        let mut invocation = BackendInvocation::new(executable, &self.config.working_directory)
            .with_arguments(daemon_arguments(port, &secret, &self.config.extra_arguments));
        if let Some(log) = &self.config.log_file {
            invocation = invocation.with_log_file(log);
        }

        let mut child = spawn_invocation(&invocation)?;
        let endpoint = Url::parse(&format!("http://127.0.0.1:{port}/jsonrpc"))
            .map_err(|e| RuntimeError::RpcTransport(e.to_string()))?;
        let client = Arc::new(Aria2RpcClient::new(self.http.clone(), endpoint, secret));

        let started = Instant::now();
        loop {
            if let Ok(version) = client.get_version().await {
                info!(port, version = %version.version, "aria2 RPC daemon ready");
                return Ok(RunningDaemon {
                    child,
                    client,
                    executable: executable.to_path_buf(),
                });
            }

            if let Ok(Some(status)) = child.try_wait() {
                return Err(RuntimeError::RpcTransport(format!(
                    "aria2 daemon exited during startup with {:?}",
                    status.code()
                )));
            }

            if started.elapsed() >= self.config.startup_timeout {
                let _ = shutdown_child(&mut child, SHUTDOWN_GRACE).await;
                return Err(RuntimeError::DaemonNotReady(self.config.startup_timeout));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    pub async fn is_running(&self) -> bool {
        let mut state = self.state.lock().await;
        state
            .as_mut()
            .is_some_and(|running| matches!(running.child.try_wait(), Ok(None)))
    }

    /// Ask the daemon to exit, then reap it.
    pub async fn shutdown(&self) -> RuntimeResult<()> {
        let Some(mut running) = self.state.lock().await.take() else {
            return Ok(());
        };

        if let Err(e) = running.client.shutdown().await {
            debug!(error = %e, "aria2.shutdown failed, terminating process");
        }
        match tokio::time::timeout(SHUTDOWN_GRACE, running.child.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                shutdown_child(&mut running.child, SHUTDOWN_GRACE).await?;
            }
        }
        info!("aria2 RPC daemon stopped");
        Ok(())
    }
}

/// Command line for daemon mode. Job options are passed per `addUri`.
fn daemon_arguments(port: u16, secret: &str, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        "--enable-rpc=true".to_string(),
        "--rpc-listen-all=false".to_string(),
        format!("--rpc-listen-port={port}"),
        format!("--rpc-secret={secret}"),
        format!("--stop-with-process={}", std::process::id()),
        "--daemon=false".to_string(),
        "--max-download-result=100".to_string(),
    ];
    args.extend(extra.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_arguments_bind_loopback_with_secret() {
        let args = daemon_arguments(6801, "abc", &["--disable-ipv6=true".to_string()]);
        assert!(args.contains(&"--rpc-listen-all=false".to_string()));
        assert!(args.contains(&"--rpc-listen-port=6801".to_string()));
        assert!(args.contains(&"--rpc-secret=abc".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--stop-with-process=")));
        assert_eq!(args.last().map(String::as_str), Some("--disable-ipv6=true"));
    }

    #[tokio::test]
    async fn test_shutdown_without_start_is_noop() {
        let daemon = Aria2Daemon::new(reqwest::Client::new(), DaemonConfig::default());
        assert!(!daemon.is_running().await);
        daemon.shutdown().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_startup_fails_when_process_exits() {
        let tmp = tempfile::tempdir().unwrap();
        let config = DaemonConfig {
            startup_timeout: Duration::from_secs(5),
            log_file: None,
            working_directory: tmp.path().to_path_buf(),
            extra_arguments: Vec::new(),
        };
        let daemon = Aria2Daemon::new(reqwest::Client::new(), config);

        let err = daemon
            .ensure_started(Path::new("/bin/false"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::RpcTransport(_)));
        assert!(!daemon.is_running().await);
    }
}
