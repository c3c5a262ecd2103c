//! Shared reqwest client construction.

use std::time::Duration;

use reqwest::tls;

use crate::error::{RuntimeError, RuntimeResult};

/// Map an aria2-style TLS version string (`TLSv1.2`) to reqwest's type.
pub fn parse_tls_version(value: &str) -> Option<tls::Version> {
    match value.trim().to_ascii_uppercase().as_str() {
        "TLSV1.2" | "1.2" => Some(tls::Version::TLS_1_2),
        "TLSV1.3" | "1.3" => Some(tls::Version::TLS_1_3),
        _ => None,
    }
}

/// HTTP client used for probes, native transfers, installs and RPC.
///
/// Connections are bounded by `connect_timeout`; transfers themselves have
/// no overall timeout since callers impose their own.
pub fn build_http_client(user_agent: &str, min_tls_version: &str) -> RuntimeResult<reqwest::Client> {
    let min_tls = parse_tls_version(min_tls_version).ok_or_else(|| {
        RuntimeError::HttpClient(format!("unsupported minimum TLS version '{min_tls_version}'"))
    })?;

    reqwest::Client::builder()
        .user_agent(user_agent)
        .min_tls_version(min_tls)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| RuntimeError::HttpClient(format!("failed to create HTTP client: {e}")))
}
