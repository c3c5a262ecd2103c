//! Pure helpers for deriving an output file name.
//!
//! The network half of resolution (the `HEAD` probe) lives in
//! `ariafetch-download`; everything here is deterministic and cheap to
//! test.

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone};
use regex::Regex;
use url::Url;

/// Prefix of synthesized names.
pub const TEMP_FILE_PREFIX: &str = "TempFile-";

/// Characters rejected by at least one mainstream filesystem.
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Headers that never carry a file name but often contain dotted tokens
/// (host names, versions, MIME subtypes).
const SCAN_SKIPPED_HEADERS: &[&str] = &[
    "content-disposition",
    "content-type",
    "etag",
    "date",
    "server",
    "via",
    "alt-svc",
    "set-cookie",
    "strict-transport-security",
    "content-security-policy",
    "access-control-allow-origin",
    "report-to",
    "nel",
    "x-served-by",
    "x-powered-by",
    "x-github-request-id",
    "age",
    "last-modified",
    "expires",
];

static FILE_NAME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-. ()+\[\]]*\.([A-Za-z0-9]{1,8})$")
        .unwrap_or_else(|_| unreachable!("file name token pattern is valid"))
});

/// Remove characters that are invalid in file names.
///
/// Control characters and `<>:"/\|?*` are dropped; surrounding whitespace
/// and trailing dots are trimmed. Returns an empty string when nothing
/// usable remains.
pub fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && !INVALID_FILE_NAME_CHARS.contains(c))
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.').trim_end();
    if trimmed == "." || trimmed == ".." {
        return String::new();
    }
    trimmed.to_string()
}

/// Last non-empty path segment of `url`, percent-decoded.
fn last_segment(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())?;
    Some(
        urlencoding::decode(segment)
            .map_or_else(|_| segment.to_string(), std::borrow::Cow::into_owned),
    )
}

/// Name taken from the URL path when its last segment contains a dot.
///
/// The dot test runs on the raw segment, so `file.` still counts (and is
/// saved as `file`). The query string is never part of the result.
pub fn leaf_name_from_url(url: &Url) -> Option<String> {
    let segment = last_segment(url)?;
    if !segment.contains('.') {
        return None;
    }
    let name = sanitize_file_name(&segment);
    (!name.is_empty()).then_some(name)
}

/// Extension hint (with leading dot) for a synthesized name.
///
/// Looks at the last path segment, then at query values shaped like a file
/// name.
pub fn extension_hint(url: &Url) -> Option<String> {
    let from_segment = last_segment(url).and_then(|s| extension_of(&s));
    from_segment.or_else(|| {
        url.query_pairs()
            .find_map(|(_, value)| extension_of(&sanitize_file_name(&value)))
    })
}

fn extension_of(name: &str) -> Option<String> {
    let caps = FILE_NAME_TOKEN.captures(name)?;
    let ext = caps.get(1)?.as_str();
    ext.chars()
        .any(|c| c.is_ascii_alphabetic())
        .then(|| format!(".{ext}"))
}

/// Parse a file name out of a `Content-Disposition` value.
///
/// `filename*=` (RFC 5987, e.g. `UTF-8''na%C3%AFve.txt`) takes precedence
/// over `filename=`. Directory components are stripped.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'language'percent-encoded
                let encoded = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
                let encoded = encoded.trim_matches('"');
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    extended = Some(decoded.into_owned());
                }
            }
            "filename" => {
                let unquoted = raw
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(raw);
                plain = Some(unquoted.replace("\\\"", "\""));
            }
            _ => {}
        }
    }

    extended
        .into_iter()
        .chain(plain)
        .map(|name| {
            let leaf = name.rsplit(['/', '\\']).next().unwrap_or_default().to_string();
            sanitize_file_name(&leaf)
        })
        .find(|name| !name.is_empty())
}

/// Last-resort scan of response headers for a `name.ext` token.
///
/// Headers are checked in order; within one value the last matching token
/// wins, so `Location: https://cdn.example/files/report.pdf` yields
/// `report.pdf` rather than the host name.
pub fn scan_headers_for_file_name(headers: &[(String, String)]) -> Option<String> {
    headers
        .iter()
        .filter(|(name, _)| !SCAN_SKIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str()))
        .find_map(|(_, value)| {
            value
                .split(|c: char| {
                    c.is_whitespace() || matches!(c, ';' | ',' | '=' | '"' | '\'' | '/' | '?' | '&')
                })
                .filter(|token| extension_of(token).is_some())
                .last()
                .map(sanitize_file_name)
                .filter(|name| !name.is_empty())
        })
}

/// `TempFile-<yyyyMMdd-HHmmss><ext>` for when no name can be derived.
pub fn synthesize_temp_name<Tz>(url: &Url, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let ext = extension_hint(url).unwrap_or_default();
    format!("{TEMP_FILE_PREFIX}{}{ext}", now.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_leaf_name_strips_query() {
        let name = leaf_name_from_url(&url("https://example.com/pkg/archive.zip?token=abc&x=1"));
        assert_eq!(name.as_deref(), Some("archive.zip"));
    }

    #[test]
    fn test_leaf_name_decodes_and_sanitizes() {
        let name = leaf_name_from_url(&url("https://example.com/files/my%20re%3Aport%3F.pdf"));
        assert_eq!(name.as_deref(), Some("my report.pdf"));
    }

    #[test]
    fn test_leaf_name_requires_dot() {
        assert!(leaf_name_from_url(&url("https://api.example.com/download?id=42")).is_none());
        assert!(leaf_name_from_url(&url("https://example.com/")).is_none());
        assert!(leaf_name_from_url(&url("https://example.com/latest")).is_none());
    }

    #[test]
    fn test_leaf_name_with_trailing_dot_needs_no_probe() {
        let name = leaf_name_from_url(&url("https://example.com/file."));
        assert_eq!(name.as_deref(), Some("file"));
        assert!(leaf_name_from_url(&url("https://example.com/...")).is_none());
    }

    #[test]
    fn test_leaf_name_trailing_slash() {
        let name = leaf_name_from_url(&url("https://example.com/dist/tool-1.2.tar.gz/"));
        assert_eq!(name.as_deref(), Some("tool-1.2.tar.gz"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_name("a<b>c:d\"e|f?g*h.txt"), "abcdefgh.txt");
        assert_eq!(sanitize_file_name("  name.txt.. "), "name.txt");
        assert_eq!(sanitize_file_name("bad\u{0007}bell.bin"), "badbell.bin");
        assert_eq!(sanitize_file_name(".."), "");
        assert_eq!(sanitize_file_name("???"), "");
    }

    #[test]
    fn test_content_disposition_quoted() {
        assert_eq!(
            parse_content_disposition("attachment; filename=\"report.pdf\"").as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn test_content_disposition_unquoted() {
        assert_eq!(
            parse_content_disposition("attachment; filename=data.csv; size=10").as_deref(),
            Some("data.csv")
        );
    }

    #[test]
    fn test_content_disposition_extended_wins() {
        let value = "attachment; filename=\"fallback.txt\"; filename*=UTF-8''na%C3%AFve%20file.txt";
        assert_eq!(
            parse_content_disposition(value).as_deref(),
            Some("na\u{ef}ve file.txt")
        );
    }

    #[test]
    fn test_content_disposition_strips_directories() {
        assert_eq!(
            parse_content_disposition("attachment; filename=\"../../etc/passwd.txt\"").as_deref(),
            Some("passwd.txt")
        );
    }

    #[test]
    fn test_content_disposition_without_name() {
        assert!(parse_content_disposition("inline").is_none());
        assert!(parse_content_disposition("attachment; filename=\"\"").is_none());
    }

    #[test]
    fn test_scan_headers_prefers_location_leaf() {
        let headers = vec![
            ("Server".to_string(), "nginx/1.25.3".to_string()),
            ("Date".to_string(), "Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
            (
                "Location".to_string(),
                "https://cdn.example.com/files/report.pdf?sig=1".to_string(),
            ),
        ];
        assert_eq!(scan_headers_for_file_name(&headers).as_deref(), Some("report.pdf"));
    }

    #[test]
    fn test_scan_headers_ignores_versions() {
        let headers = vec![
            ("X-Api-Version".to_string(), "1.2".to_string()),
            ("Content-Type".to_string(), "application/octet-stream".to_string()),
        ];
        assert!(scan_headers_for_file_name(&headers).is_none());
    }

    #[test]
    fn test_scan_headers_ignores_mime_and_etag() {
        let headers = vec![
            (
                "Content-Type".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
            ),
            ("ETag".to_string(), "\"v2.backup\"".to_string()),
        ];
        assert!(scan_headers_for_file_name(&headers).is_none());

        let mut with_name = headers;
        with_name.push(("X-File-Name".to_string(), "minutes.docx".to_string()));
        assert_eq!(
            scan_headers_for_file_name(&with_name).as_deref(),
            Some("minutes.docx")
        );
    }

    #[test]
    fn test_synthesized_name_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let name = synthesize_temp_name(&url("https://api.example.com/download?id=42"), &now);
        assert_eq!(name, "TempFile-20240309-070501");

        let name = synthesize_temp_name(&url("https://x.example/get?file=image.png"), &now);
        assert_eq!(name, "TempFile-20240309-070501.png");
    }
}
