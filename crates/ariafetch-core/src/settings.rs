//! Download settings and validation.
//!
//! Pure configuration types. The CLI fills them from flags and
//! `ARIAFETCH_*` environment variables; library callers construct them
//! directly.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{AcceleratorLogLevel, MAX_CONNECTIONS_CEILING};

/// User agent sent by both backends.
pub const DEFAULT_USER_AGENT: &str = concat!("ariafetch/", env!("CARGO_PKG_VERSION"));

/// Minimum TLS version passed to the accelerator.
pub const DEFAULT_MIN_TLS_VERSION: &str = "TLSv1.2";

/// Minimum split size passed to the accelerator.
pub const DEFAULT_MIN_SPLIT_SIZE: &str = "1M";

/// Host that gets a token by default.
pub const DEFAULT_AUTH_HOST: &str = "api.github.com";

/// Secret name looked up for the default host.
pub const DEFAULT_AUTH_SECRET: &str = "github-token";

/// Maps an API host to the secret that authenticates against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRule {
    /// Host name, matched exactly or as a dot-suffix (`github.com` matches `api.github.com`).
    pub host: String,
    /// Name of the secret to fetch from the secret store.
    pub secret_name: String,
    /// Also send `Accept: application/octet-stream` (release asset APIs).
    pub accept_octet_stream: bool,
}

impl AuthRule {
    pub fn new(host: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
            secret_name: secret_name.into(),
            accept_octet_stream: false,
        }
    }

    #[must_use]
    pub const fn with_octet_stream(mut self) -> Self {
        self.accept_octet_stream = true;
        self
    }

    /// Whether this rule applies to `host`.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// Tunables for the download subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Connections per server and split count (1-16).
    pub max_connections: u32,
    /// aria2 `--min-split-size` value, e.g. `1M`.
    pub min_split_size: String,
    /// aria2 `--max-tries`; `0` retries forever, bounded by the caller timeout.
    pub max_tries: u32,
    pub user_agent: String,
    pub min_tls_version: String,
    pub disable_ipv6: bool,
    /// Pass every bindable IPv4 interface to aria2 `--multiple-interface`.
    pub use_multiple_interfaces: bool,
    /// Drive the accelerator through its JSON-RPC daemon instead of one process per file.
    pub rpc_mode: bool,
    /// Console log level of the RPC daemon. Direct-process attempts use the
    /// request's level instead.
    pub daemon_log_level: AcceleratorLogLevel,
    /// Fetch the pinned aria2 release when it is missing.
    pub auto_install: bool,
    /// Explicit accelerator path, tried before the tools directory and `PATH`.
    pub aria2_path: Option<PathBuf>,
    pub native_poll_interval_ms: u64,
    pub rpc_poll_interval_ms: u64,
    pub rpc_startup_timeout_ms: u64,
    pub auth_rules: Vec<AuthRule>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_connections: MAX_CONNECTIONS_CEILING,
            min_split_size: DEFAULT_MIN_SPLIT_SIZE.to_string(),
            max_tries: 0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_tls_version: DEFAULT_MIN_TLS_VERSION.to_string(),
            disable_ipv6: true,
            use_multiple_interfaces: true,
            rpc_mode: false,
            daemon_log_level: AcceleratorLogLevel::default(),
            auto_install: true,
            aria2_path: None,
            native_poll_interval_ms: 2_000,
            rpc_poll_interval_ms: 500,
            rpc_startup_timeout_ms: 10_000,
            auth_rules: vec![
                AuthRule::new(DEFAULT_AUTH_HOST, DEFAULT_AUTH_SECRET).with_octet_stream(),
            ],
        }
    }
}

impl DownloadSettings {
    pub const fn native_poll_interval(&self) -> Duration {
        Duration::from_millis(self.native_poll_interval_ms)
    }

    pub const fn rpc_poll_interval(&self) -> Duration {
        Duration::from_millis(self.rpc_poll_interval_ms)
    }

    pub const fn rpc_startup_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_startup_timeout_ms)
    }

    /// The first auth rule matching `host`.
    pub fn auth_rule_for(&self, host: &str) -> Option<&AuthRule> {
        self.auth_rules.iter().find(|rule| rule.matches(host))
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Max connections must be between 1 and {MAX_CONNECTIONS_CEILING}, got {0}")]
    InvalidConnections(u32),

    #[error("Min split size must look like 1M or 512K, got '{0}'")]
    InvalidSplitSize(String),

    #[error("Poll interval for {0} must be greater than zero")]
    ZeroPollInterval(&'static str),

    #[error("Auth rule for '{0}' has an empty host or secret name")]
    InvalidAuthRule(String),
}

/// Validate settings before handing them to the engines.
pub fn validate_settings(settings: &DownloadSettings) -> Result<(), SettingsError> {
    if !(1..=MAX_CONNECTIONS_CEILING).contains(&settings.max_connections) {
        return Err(SettingsError::InvalidConnections(settings.max_connections));
    }

    if !is_valid_split_size(&settings.min_split_size) {
        return Err(SettingsError::InvalidSplitSize(
            settings.min_split_size.clone(),
        ));
    }

    if settings.native_poll_interval_ms == 0 {
        return Err(SettingsError::ZeroPollInterval("native transfers"));
    }
    if settings.rpc_poll_interval_ms == 0 {
        return Err(SettingsError::ZeroPollInterval("rpc"));
    }

    if let Some(rule) = settings
        .auth_rules
        .iter()
        .find(|r| r.host.trim().is_empty() || r.secret_name.trim().is_empty())
    {
        return Err(SettingsError::InvalidAuthRule(rule.host.clone()));
    }

    Ok(())
}

fn is_valid_split_size(value: &str) -> bool {
    let value = value.trim();
    let digits = value.trim_end_matches(['K', 'M', 'k', 'm']);
    let suffix_len = value.len() - digits.len();
    suffix_len <= 1 && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
