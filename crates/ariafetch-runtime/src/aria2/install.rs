//! Pinned aria2 release installer.
//!
//! aria2 only publishes prebuilt archives for Windows; elsewhere the
//! package manager's `aria2c` on `PATH` is expected.
//!
//! Installing is idempotent: an existing executable in the tools
//! directory is left alone unless `force` is set.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use ariafetch_core::accelerator_file_name;
use chrono::Utc;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};

/// Pinned aria2 release.
pub const ARIA2_VERSION: &str = "1.37.0";

/// Base URL of the pinned release's assets.
pub const ARIA2_RELEASE_BASE_URL: &str =
    "https://github.com/aria2/aria2/releases/download/release-1.37.0";

/// Marker written next to the executable after a successful install.
pub const INSTALL_MARKER: &str = "aria2-install.json";

/// Result of checking pre-built binary availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrebuiltAvailability {
    Available {
        /// Archive file name in the release.
        asset: String,
        /// Description for user-facing messages.
        description: String,
    },
    NotAvailable {
        reason: String,
    },
}

/// Check whether the pinned release has an archive for this platform.
pub fn check_prebuilt_availability() -> PrebuiltAvailability {
    #[cfg(all(target_os = "windows", target_arch = "x86_64"))]
    {
        PrebuiltAvailability::Available {
            asset: format!("aria2-{ARIA2_VERSION}-win-64bit-build1.zip"),
            description: "Windows x64".to_string(),
        }
    }

    #[cfg(all(target_os = "windows", target_arch = "x86"))]
    {
        PrebuiltAvailability::Available {
            asset: format!("aria2-{ARIA2_VERSION}-win-32bit-build1.zip"),
            description: "Windows x86".to_string(),
        }
    }

    #[cfg(not(all(target_os = "windows", any(target_arch = "x86_64", target_arch = "x86"))))]
    {
        PrebuiltAvailability::NotAvailable {
            reason: "aria2 publishes prebuilt binaries for Windows only; install aria2 with your package manager".to_string(),
        }
    }
}

/// Contents of the install marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRecord {
    pub version: String,
    pub asset: String,
    pub installed_at: chrono::DateTime<Utc>,
}

/// Downloads and unpacks the pinned release into the tools directory.
#[derive(Debug, Clone)]
pub struct Aria2Installer {
    client: reqwest::Client,
    tools_dir: PathBuf,
    base_url: String,
}

impl Aria2Installer {
    pub fn new(client: reqwest::Client, tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            tools_dir: tools_dir.into(),
            base_url: ARIA2_RELEASE_BASE_URL.to_string(),
        }
    }

    /// Override the release URL (mirrors, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Path the executable is installed to.
    pub fn target_path(&self) -> PathBuf {
        self.tools_dir.join(accelerator_file_name())
    }

    /// Read the install marker, if present.
    pub fn installed_record(&self) -> Option<InstallRecord> {
        let contents = fs::read_to_string(self.tools_dir.join(INSTALL_MARKER)).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Install the archive for this platform.
    pub async fn install(&self, force: bool) -> RuntimeResult<PathBuf> {
        let target = self.target_path();
        if target.is_file() && !force {
            debug!(path = %target.display(), "aria2c already installed");
            return Ok(target);
        }

        match check_prebuilt_availability() {
            PrebuiltAvailability::Available { asset, description } => {
                info!(%description, version = ARIA2_VERSION, "Installing prebuilt aria2");
                self.install_asset(&asset, force).await
            }
            PrebuiltAvailability::NotAvailable { reason } => {
                Err(RuntimeError::PrebuiltNotAvailable { reason })
            }
        }
    }

    /// Download `asset` from the release and extract the executable.
    pub async fn install_asset(&self, asset: &str, force: bool) -> RuntimeResult<PathBuf> {
        let target = self.target_path();
        if target.is_file() && !force {
            return Ok(target);
        }

        fs::create_dir_all(&self.tools_dir)?;
        let archive = self.tools_dir.join(format!("{asset}.download"));
        let url = format!("{}/{asset}", self.base_url);

        let result = async {
            self.download(&url, &archive).await?;
            extract_executable(&archive, &target)?;
            self.write_marker(asset)
        }
        .await;
        let _ = fs::remove_file(&archive);
        result?;

        info!(path = %target.display(), "aria2c installed");
        Ok(target)
    }

    async fn download(&self, url: &str, dest: &Path) -> RuntimeResult<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RuntimeError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RuntimeError::DownloadFailed(format!(
                "HTTP {} for {url}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| RuntimeError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    fn write_marker(&self, asset: &str) -> RuntimeResult<()> {
        let record = InstallRecord {
            version: ARIA2_VERSION.to_string(),
            asset: asset.to_string(),
            installed_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| RuntimeError::ExtractionFailed(e.to_string()))?;
        fs::write(self.tools_dir.join(INSTALL_MARKER), json)?;
        Ok(())
    }
}

/// Copy the accelerator executable out of a release zip.
///
/// Release archives nest the binary in a versioned folder, so entries are
/// matched by file name only.
fn extract_executable(zip_path: &Path, target: &Path) -> RuntimeResult<()> {
    let file = File::open(zip_path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| RuntimeError::ExtractionFailed(e.to_string()))?;

    let wanted = accelerator_file_name();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| RuntimeError::ExtractionFailed(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let matches = entry
            .name()
            .rsplit('/')
            .next()
            .is_some_and(|name| name.eq_ignore_ascii_case(wanted));
        if !matches {
            continue;
        }

        let staging = target.with_extension("extracting");
        {
            let mut out = File::create(&staging)?;
            io::copy(&mut entry, &mut out)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&staging)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&staging, perms)?;
        }

        fs::rename(&staging, target)?;
        return Ok(());
    }

    Err(RuntimeError::ExtractionFailed(format!(
        "{wanted} not found in {}",
        zip_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn release_zip() -> Vec<u8> {
        let mut buf = io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("aria2-1.37.0/README.html", options).unwrap();
            zip.write_all(b"readme").unwrap();
            zip.start_file(format!("aria2-1.37.0/{}", accelerator_file_name()), options)
                .unwrap();
            zip.write_all(b"fake aria2c").unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_install_asset_extracts_executable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/aria2-test.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(release_zip()))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let installer =
            Aria2Installer::new(reqwest::Client::new(), tmp.path()).with_base_url(server.uri());

        let path = installer.install_asset("aria2-test.zip", false).await.unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"fake aria2c");
        assert!(!tmp.path().join("aria2-test.zip.download").exists());

        let record = installer.installed_record().unwrap();
        assert_eq!(record.version, ARIA2_VERSION);
        assert_eq!(record.asset, "aria2-test.zip");

        // Second call is a no-op (the mock expects exactly one request)
        installer.install_asset("aria2-test.zip", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_install_asset_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let installer =
            Aria2Installer::new(reqwest::Client::new(), tmp.path()).with_base_url(server.uri());

        let err = installer.install_asset("missing.zip", false).await.unwrap_err();
        assert!(matches!(err, RuntimeError::DownloadFailed(_)));
        assert!(!installer.target_path().exists());
    }

    #[test]
    fn test_extract_rejects_archive_without_binary() {
        let tmp = tempdir().unwrap();
        let zip_path = tmp.path().join("empty.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&zip_path).unwrap());
            zip.start_file("README", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"x").unwrap();
            zip.finish().unwrap();
        }
        let err = extract_executable(&zip_path, &tmp.path().join("aria2c")).unwrap_err();
        assert!(matches!(err, RuntimeError::ExtractionFailed(_)));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_no_prebuilt_outside_windows() {
        assert!(matches!(
            check_prebuilt_availability(),
            PrebuiltAvailability::NotAvailable { .. }
        ));
    }
}
