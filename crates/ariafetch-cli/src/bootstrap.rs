//! CLI bootstrap - the composition root.
//!
//! The only place where concrete adapters are wired together:
//! - Settings from command-line and environment options
//! - `EnvSecretStore` for tokens
//! - reqwest, aria2c locator/installer and sysinfo via `OrchestratorDeps`
//!
//! Command handlers receive the composed `Orchestrator` and request template.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ariafetch_core::{
    DownloadRequest, DownloadSettings, SecretRef, UrlSource, logs_dir, parse_source_url, tools_dir,
    validate_settings,
};
use ariafetch_download::{DownloadOptions, Orchestrator, OrchestratorDeps, build_orchestrator};
use tracing_subscriber::EnvFilter;

use crate::commands::GetArgs;
use crate::error::CliError;
use crate::secrets::EnvSecretStore;

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings for a `get` invocation.
pub fn settings_from_args(args: &GetArgs) -> Result<DownloadSettings, CliError> {
    let settings = DownloadSettings {
        max_connections: args.connections,
        rpc_mode: args.rpc,
        daemon_log_level: args.log_level,
        use_multiple_interfaces: !args.no_multi_interface,
        auto_install: !args.no_install,
        aria2_path: args.aria2_path.clone(),
        ..DownloadSettings::default()
    };
    validate_settings(&settings).map_err(|e| CliError::Arguments(e.to_string()))?;
    Ok(settings)
}

/// Where the URLs for a `get` invocation come from.
pub fn url_source(args: &GetArgs) -> UrlSource {
    match &args.url_file {
        Some(path) => UrlSource::ByUrlFile(path.clone()),
        None => UrlSource::ByUrl(args.urls.clone()),
    }
}

/// Per-URL options shared by every URL of a `get` invocation.
///
/// The template's own URL is a placeholder: each loaded URL replaces it.
pub fn request_template(args: &GetArgs, first_url: &str) -> Result<DownloadRequest, CliError> {
    let url = parse_source_url(first_url)?;
    let mut request = DownloadRequest::new(url, &args.dest)?
        .with_preference(args.backend)
        .with_max_connections(args.connections)
        .with_log_level(args.log_level);
    for (name, value) in &args.headers {
        request = request.with_header(name, value);
    }
    if let Some(secret) = &args.secret {
        request = request.with_auth_secret(SecretRef::new(secret));
    }
    Ok(request)
}

/// Cancellation and timeout for a `get` invocation.
pub fn download_options(args: &GetArgs) -> DownloadOptions {
    DownloadOptions::new().with_timeout(args.timeout.map(Duration::from_secs))
}

/// Compose the orchestrator with production adapters.
pub fn bootstrap(settings: DownloadSettings) -> Result<Orchestrator> {
    let tools = tools_dir().map_err(CliError::from)?;
    let logs = logs_dir().map_err(CliError::from)?;
    let deps = OrchestratorDeps::with_defaults(
        settings,
        Arc::new(EnvSecretStore::new()),
        tools,
        Some(logs),
    )
    .map_err(CliError::from)?;
    Ok(build_orchestrator(deps))
}
