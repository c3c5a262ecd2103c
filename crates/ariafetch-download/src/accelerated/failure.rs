//! Mapping aria2 failures onto `DownloadError`.
//!
//! aria2 reports HTTP refusals in its console log (`status=403`) and via
//! error code 24 ("HTTP authorization failed"). RPC mode sees the same
//! code and message in `aria2.tellStatus`.

use std::sync::LazyLock;

use ariafetch_core::DownloadError;
use regex::Regex;

/// aria2 exit / error code for an HTTP authorization failure.
pub const AUTH_FAILED_CODE: i32 = 24;

static HTTP_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:status=|HTTP/\d(?:\.\d)?\s+)(\d{3})\b")
        .unwrap_or_else(|_| unreachable!("status pattern is valid"))
});

/// The last 401/403/404 status in `text`, if any.
pub fn refusal_status(text: &str) -> Option<u16> {
    HTTP_STATUS
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u16>().ok())
        .filter(|status| matches!(status, 401 | 403 | 404))
        .last()
}

/// Whether an HTTP status means the credentials were missing or rejected.
///
/// 404 only counts for authenticated API hosts, which hide private
/// resources behind it.
pub const fn is_auth_status(status: u16, requires_auth: bool) -> bool {
    match status {
        401 | 403 => true,
        404 => requires_auth,
        _ => false,
    }
}

/// Classify a failed aria2 job from its error code and log/message text.
pub fn classify_failure(
    code: Option<i32>,
    text: &str,
    host: &str,
    requires_auth: bool,
) -> DownloadError {
    if let Some(status) = refusal_status(text).filter(|s| is_auth_status(*s, requires_auth)) {
        return DownloadError::auth_required(host, Some(status));
    }
    if code == Some(AUTH_FAILED_CODE) {
        return DownloadError::auth_required(host, Some(401));
    }
    DownloadError::non_zero_exit(code)
}
