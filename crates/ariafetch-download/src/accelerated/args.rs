//! aria2c option sets.
//!
//! The same options drive both modes. Direct-process mode gets all of them
//! on the command line; RPC mode sends the per-job ones with `aria2.addUri`
//! and passes the global ones when the daemon starts.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use ariafetch_core::{AcceleratorLogLevel, DownloadRequest, DownloadSettings, ResolvedTarget};
use serde_json::{Map, Value};

/// Connection count for a request: the smaller of the request's and the settings' limit.
pub fn effective_connections(settings: &DownloadSettings, request: &DownloadRequest) -> u32 {
    request.max_connections().min(settings.max_connections).max(1)
}

/// Options `aria2.addUri` accepts per job, in command-line order.
fn job_options(
    settings: &DownloadSettings,
    connections: u32,
    target: &ResolvedTarget,
) -> Vec<(&'static str, String)> {
    vec![
        ("continue", "true".to_string()),
        ("max-connection-per-server", connections.to_string()),
        ("split", connections.to_string()),
        ("min-split-size", settings.min_split_size.clone()),
        ("max-tries", settings.max_tries.to_string()),
        ("allow-overwrite", target.overwrite.to_string()),
        ("auto-file-renaming", "false".to_string()),
        ("user-agent", settings.user_agent.clone()),
        ("dir", target.directory().display().to_string()),
        ("out", target.file_name()),
    ]
}

/// Options that only exist process-wide.
fn global_options(
    settings: &DownloadSettings,
    log_level: AcceleratorLogLevel,
    interfaces: &[Ipv4Addr],
) -> Vec<(&'static str, String)> {
    let mut options = vec![
        ("min-tls-version", settings.min_tls_version.clone()),
        ("disable-ipv6", settings.disable_ipv6.to_string()),
        ("console-log-level", log_level.as_str().to_string()),
    ];
    if let Some(list) = interface_list(settings, interfaces) {
        options.push(("multiple-interface", list));
    }
    options
}

fn interface_list(settings: &DownloadSettings, interfaces: &[Ipv4Addr]) -> Option<String> {
    if !settings.use_multiple_interfaces || interfaces.is_empty() {
        return None;
    }
    Some(
        interfaces
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn header_lines(headers: &BTreeMap<String, String>) -> impl Iterator<Item = String> + '_ {
    headers.iter().map(|(name, value)| format!("{name}: {value}"))
}

/// Full command line for one direct-process attempt.
pub fn command_line(
    settings: &DownloadSettings,
    request: &DownloadRequest,
    target: &ResolvedTarget,
    headers: &BTreeMap<String, String>,
    interfaces: &[Ipv4Addr],
) -> Vec<String> {
    let connections = effective_connections(settings, request);
    let mut args: Vec<String> = job_options(settings, connections, target)
        .into_iter()
        .map(|(key, value)| format!("--{key}={value}"))
        .collect();
    // Each attempt is its own process with a single job.
    args.insert(2, format!("--max-concurrent-downloads={connections}"));

    args.extend(header_lines(headers).map(|line| format!("--header={line}")));
    args.extend(
        global_options(settings, request.log_level(), interfaces)
            .into_iter()
            .map(|(key, value)| format!("--{key}={value}")),
    );
    args.push("--summary-interval=0".to_string());
    args.push(target.source_url.to_string());
    args
}

/// `aria2.addUri` options for one RPC job.
pub fn rpc_job_options(
    settings: &DownloadSettings,
    request: &DownloadRequest,
    target: &ResolvedTarget,
    headers: &BTreeMap<String, String>,
) -> Map<String, Value> {
    let connections = effective_connections(settings, request);
    let mut options: Map<String, Value> = job_options(settings, connections, target)
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)))
        .collect();
    if !headers.is_empty() {
        options.insert(
            "header".to_string(),
            Value::Array(header_lines(headers).map(Value::String).collect()),
        );
    }
    options
}

/// Global arguments for the RPC daemon.
pub fn daemon_arguments(settings: &DownloadSettings, interfaces: &[Ipv4Addr]) -> Vec<String> {
    global_options(settings, settings.daemon_log_level, interfaces)
        .into_iter()
        .map(|(key, value)| format!("--{key}={value}"))
        .collect()
}
