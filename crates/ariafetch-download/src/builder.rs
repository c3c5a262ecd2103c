//! Composition root for the orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use ariafetch_core::{
    AcceleratorLocator, DownloadResult, DownloadSettings, HeaderProbe, InterfaceProbe,
    NativeTransferPort, SecretStore,
};
use ariafetch_runtime::{
    Aria2Daemon, Aria2Installer, Aria2Locator, DaemonConfig, HttpTransferService,
    SysinfoInterfaceProbe, build_http_client,
};

use crate::accelerated::args::daemon_arguments;
use crate::accelerated::{AcceleratedEngine, DirectEngine, RpcEngine};
use crate::auth::RepoAuthenticator;
use crate::native::NativeEngine;
use crate::orchestrator::Orchestrator;
use crate::resolver::{FilenameResolver, ReqwestHeaderProbe};
use crate::selector::BackendSelector;

/// Everything needed to construct an `Orchestrator`.
///
/// Collaborators are injected as ports, so tests (and embedders) can swap
/// any of them.
pub struct OrchestratorDeps {
    pub settings: DownloadSettings,
    /// Shared HTTP client for the RPC daemon.
    pub http: reqwest::Client,
    pub secret_store: Arc<dyn SecretStore>,
    pub locator: Arc<dyn AcceleratorLocator>,
    pub header_probe: Arc<dyn HeaderProbe>,
    pub interfaces: Arc<dyn InterfaceProbe>,
    pub transfers: Arc<dyn NativeTransferPort>,
    /// Directory for per-attempt aria2 logs.
    pub log_dir: Option<PathBuf>,
}

impl OrchestratorDeps {
    /// Production wiring: reqwest for HTTP, aria2c from the tools directory
    /// or `PATH`, sysinfo for interfaces.
    pub fn with_defaults(
        settings: DownloadSettings,
        secret_store: Arc<dyn SecretStore>,
        tools_dir: PathBuf,
        log_dir: Option<PathBuf>,
    ) -> DownloadResult<Self> {
        let http = build_http_client(&settings.user_agent, &settings.min_tls_version)?;

        let mut locator =
            Aria2Locator::new(tools_dir.clone()).with_explicit_path(settings.aria2_path.clone());
        if settings.auto_install {
            locator = locator.with_installer(Aria2Installer::new(http.clone(), tools_dir));
        }

        Ok(Self {
            http: http.clone(),
            secret_store,
            locator: Arc::new(locator),
            header_probe: Arc::new(ReqwestHeaderProbe::new(http.clone())),
            interfaces: Arc::new(SysinfoInterfaceProbe),
            transfers: Arc::new(HttpTransferService::new(http)),
            log_dir,
            settings,
        })
    }
}

/// Build an orchestrator from its dependencies.
///
/// `settings.rpc_mode` picks the daemon-backed engine; otherwise aria2c
/// runs as one process per file.
pub fn build_orchestrator(deps: OrchestratorDeps) -> Orchestrator {
    let settings = Arc::new(deps.settings);

    let accelerated: Arc<dyn AcceleratedEngine> = if settings.rpc_mode {
        let interfaces = if settings.use_multiple_interfaces {
            deps.interfaces.bindable_ipv4()
        } else {
            Vec::new()
        };
        let config = DaemonConfig {
            startup_timeout: settings.rpc_startup_timeout(),
            log_file: deps.log_dir.as_ref().map(|d| d.join("aria2-daemon.log")),
            extra_arguments: daemon_arguments(&settings, &interfaces),
            ..DaemonConfig::default()
        };
        let daemon = Arc::new(Aria2Daemon::new(deps.http, config));
        Arc::new(RpcEngine::new(Arc::clone(&settings), daemon))
    } else {
        let engine = DirectEngine::new(Arc::clone(&settings), deps.interfaces);
        Arc::new(match deps.log_dir {
            Some(dir) => engine.with_log_dir(dir),
            None => engine,
        })
    };

    Orchestrator::new(
        FilenameResolver::new(deps.header_probe),
        BackendSelector::new(deps.locator),
        RepoAuthenticator::new(deps.secret_store, settings.auth_rules.clone()),
        accelerated,
        NativeEngine::new(deps.transfers, settings.native_poll_interval()),
    )
}
