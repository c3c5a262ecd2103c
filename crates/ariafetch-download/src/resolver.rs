//! Output file name resolution.
//!
//! Order of preference:
//! 1. The URL's last path segment when it carries an extension (no network)
//! 2. `Content-Disposition` from a `HEAD` probe
//! 3. Any `name.ext` token in the other probe headers
//! 4. `TempFile-<yyyyMMdd-HHmmss><ext>`
//!
//! Probe errors and an expired deadline fall through to the synthesized
//! name. Only cancellation fails resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use ariafetch_core::filename::{
    leaf_name_from_url, parse_content_disposition, scan_headers_for_file_name,
    synthesize_temp_name,
};
use ariafetch_core::{DownloadError, DownloadResult, HeaderPairs, HeaderProbe};
use async_trait::async_trait;
use chrono::Local;
use tracing::debug;
use url::Url;

use crate::options::{DownloadOptions, sleep_until_deadline};

/// `HeaderProbe` over reqwest. Redirects are followed, so the headers are
/// the final response's.
#[derive(Debug, Clone)]
pub struct ReqwestHeaderProbe {
    client: reqwest::Client,
}

impl ReqwestHeaderProbe {
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HeaderProbe for ReqwestHeaderProbe {
    async fn head(
        &self,
        url: &Url,
        headers: &BTreeMap<String, String>,
    ) -> DownloadResult<HeaderPairs> {
        let mut request = self.client.head(url.clone());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::network_with_status(
                format!("HEAD {url} returned {status}"),
                status.as_u16(),
            ));
        }

        Ok(response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect())
    }
}

/// Derives the output file name for a URL.
pub struct FilenameResolver {
    probe: Arc<dyn HeaderProbe>,
}

impl FilenameResolver {
    pub fn new(probe: Arc<dyn HeaderProbe>) -> Self {
        Self { probe }
    }

    /// Output file name for `url`. Never empty.
    ///
    /// The `HEAD` probe is bounded by the options' timeout and aborted when
    /// the cancel token fires.
    pub async fn resolve(
        &self,
        url: &Url,
        headers: &BTreeMap<String, String>,
        options: &DownloadOptions,
    ) -> DownloadResult<String> {
        if let Some(name) = leaf_name_from_url(url) {
            return Ok(name);
        }

        let probed = tokio::select! {
            biased;
            () = options.cancel.cancelled() => return Err(DownloadError::Cancelled),
            () = sleep_until_deadline(options.deadline()) => {
                Err(DownloadError::filename_resolution("HEAD probe timed out"))
            }
            result = self.name_from_probe(url, headers) => result,
        };

        Ok(probed.unwrap_or_else(|e| {
            let name = synthesize_temp_name(url, &Local::now());
            debug!(%url, error = %e, %name, "Using synthesized file name");
            name
        }))
    }

    async fn name_from_probe(
        &self,
        url: &Url,
        headers: &BTreeMap<String, String>,
    ) -> DownloadResult<String> {
        let response = self.probe.head(url, headers).await?;

        let disposition = response
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("content-disposition"))
            .find_map(|(_, value)| parse_content_disposition(value));
        if let Some(name) = disposition {
            debug!(%url, %name, "File name from Content-Disposition");
            return Ok(name);
        }

        scan_headers_for_file_name(&response)
            .inspect(|name| debug!(%url, %name, "File name from response headers"))
            .ok_or_else(|| DownloadError::filename_resolution("no file name in HEAD response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ariafetch_core::filename::TEMP_FILE_PREFIX;
    use mockall::mock;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mock! {
        pub Probe {}

        #[async_trait]
        impl HeaderProbe for Probe {
            async fn head(
                &self,
                url: &Url,
                headers: &BTreeMap<String, String>,
            ) -> DownloadResult<HeaderPairs>;
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_extension_in_path_skips_probe() {
        let mut probe = MockProbe::new();
        probe.expect_head().never();
        let resolver = FilenameResolver::new(Arc::new(probe));

        let name = resolver
            .resolve(
                &url("https://example.com/dist/archive.zip?sig=1"),
                &BTreeMap::new(),
                &DownloadOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(name, "archive.zip");
    }

    #[tokio::test]
    async fn test_content_disposition_from_probe() {
        let mut probe = MockProbe::new();
        probe.expect_head().times(1).returning(|_, _| {
            Ok(vec![(
                "Content-Disposition".to_string(),
                "attachment; filename=\"report.pdf\"".to_string(),
            )])
        });
        let resolver = FilenameResolver::new(Arc::new(probe));

        let name = resolver
            .resolve(
                &url("https://api.example.com/download?id=42"),
                &BTreeMap::new(),
                &DownloadOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(name, "report.pdf");
    }

    #[tokio::test]
    async fn test_header_scan_is_last_resort() {
        let mut probe = MockProbe::new();
        probe.expect_head().returning(|_, _| {
            Ok(vec![
                ("Content-Type".to_string(), "application/zip".to_string()),
                ("X-Object-Name".to_string(), "nightly-build.tar.gz".to_string()),
            ])
        });
        let resolver = FilenameResolver::new(Arc::new(probe));

        let name = resolver
            .resolve(
                &url("https://ci.example.com/artifacts/latest"),
                &BTreeMap::new(),
                &DownloadOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(name, "nightly-build.tar.gz");
    }

    #[tokio::test]
    async fn test_probe_failure_synthesizes_name() {
        let mut probe = MockProbe::new();
        probe
            .expect_head()
            .returning(|_, _| Err(DownloadError::network_with_status("HEAD failed", 405)));
        let resolver = FilenameResolver::new(Arc::new(probe));

        let name = resolver
            .resolve(
                &url("https://api.example.com/download?id=42"),
                &BTreeMap::new(),
                &DownloadOptions::new(),
            )
            .await
            .unwrap();
        assert!(name.starts_with(TEMP_FILE_PREFIX));
        assert_eq!(name.len(), TEMP_FILE_PREFIX.len() + "20240101-120000".len());
    }

    #[tokio::test]
    async fn test_probe_forwards_headers() {
        let mut probe = MockProbe::new();
        probe
            .expect_head()
            .withf(|_, headers| headers.get("Authorization").map(String::as_str) == Some("token t"))
            .returning(|_, _| Ok(Vec::new()));
        let resolver = FilenameResolver::new(Arc::new(probe));

        let headers = BTreeMap::from([("Authorization".to_string(), "token t".to_string())]);
        let name = resolver
            .resolve(&url("https://api.example.com/assets/7"), &headers, &DownloadOptions::new())
            .await
            .unwrap();
        assert!(name.starts_with(TEMP_FILE_PREFIX));
    }

    #[tokio::test]
    async fn test_reqwest_probe_reads_disposition() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/download"))
            .and(header("X-Token", "abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", "attachment; filename=\"report.pdf\""),
            )
            .mount(&server)
            .await;

        let resolver =
            FilenameResolver::new(Arc::new(ReqwestHeaderProbe::new(reqwest::Client::new())));
        let headers = BTreeMap::from([("X-Token".to_string(), "abc".to_string())]);
        let name = resolver
            .resolve(
                &url(&format!("{}/download?id=42", server.uri())),
                &headers,
                &DownloadOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(name, "report.pdf");
    }

    async fn stalled_head_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", "attachment; filename=\"late.bin\"")
                    .set_delay(Duration::from_secs(6)),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_stalled_probe_gives_way_to_deadline() {
        let server = stalled_head_server().await;
        let resolver =
            FilenameResolver::new(Arc::new(ReqwestHeaderProbe::new(reqwest::Client::new())));
        let options = DownloadOptions::new().with_timeout(Some(Duration::from_millis(300)));

        let started = std::time::Instant::now();
        let name = resolver
            .resolve(&url(&format!("{}/download", server.uri())), &BTreeMap::new(), &options)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(name.starts_with(TEMP_FILE_PREFIX));
    }

    #[tokio::test]
    async fn test_cancel_aborts_stalled_probe() {
        let server = stalled_head_server().await;
        let resolver =
            FilenameResolver::new(Arc::new(ReqwestHeaderProbe::new(reqwest::Client::new())));
        let options = DownloadOptions::new();
        let cancel = options.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            cancel.cancel();
        });

        let started = std::time::Instant::now();
        let err = resolver
            .resolve(&url(&format!("{}/download", server.uri())), &BTreeMap::new(), &options)
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(err, DownloadError::Cancelled);
    }

    #[tokio::test]
    async fn test_reqwest_probe_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let probe = ReqwestHeaderProbe::new(reqwest::Client::new());
        let err = probe
            .head(&url(&format!("{}/missing", server.uri())), &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Network {
                status_code: Some(404),
                ..
            }
        ));
    }
}
