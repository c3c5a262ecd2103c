//! Shared fixtures for orchestrator integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ariafetch_core::{
    AcceleratorLocator, AuthRule, DownloadError, DownloadResult, DownloadSettings, NoInterfaces,
    SecretStore, SecretValue,
};
use ariafetch_download::{Orchestrator, OrchestratorDeps, ReqwestHeaderProbe, build_orchestrator};
use ariafetch_runtime::HttpTransferService;
use async_trait::async_trait;
use tempfile::TempDir;

/// Locator answering with a fixed path, or "not found".
pub struct FixedLocator(pub Option<PathBuf>);

#[async_trait]
impl AcceleratorLocator for FixedLocator {
    async fn locate(&self) -> DownloadResult<PathBuf> {
        self.0
            .clone()
            .filter(|p| p.is_file())
            .ok_or_else(|| DownloadError::executable_not_found("aria2c"))
    }

    fn invalidate(&self) {}
}

/// In-memory secret store.
#[derive(Default)]
pub struct MemorySecrets(pub BTreeMap<String, String>);

#[async_trait]
impl SecretStore for MemorySecrets {
    async fn get_secret(&self, name: &str) -> DownloadResult<Option<SecretValue>> {
        Ok(self.0.get(name).map(SecretValue::new))
    }
}

/// Shell script standing in for aria2c. Unix only.
#[cfg(unix)]
pub fn fake_aria2c(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("aria2c");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// aria2c stand-in that writes `payload` to `--dir`/`--out`.
pub const WRITES_OUTPUT: &str = r#"for a in "$@"; do
  case "$a" in
    --dir=*) d="${a#--dir=}" ;;
    --out=*) o="${a#--out=}" ;;
  esac
done
mkdir -p "$d"
printf 'accelerated' > "$d/$o""#;

/// aria2c stand-in that claims success without writing anything.
pub const EXITS_CLEAN_WITHOUT_OUTPUT: &str = "exit 0";

/// aria2c stand-in that logs an HTTP 403 and fails.
pub const REFUSED_403: &str = "echo '[ERROR] errorCode=22 The response status is not successful. status=403'
exit 22";

pub struct Harness {
    pub tmp: TempDir,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn downloads(&self) -> PathBuf {
        self.tmp.path().join("downloads")
    }
}

pub struct HarnessBuilder {
    aria2c: Option<String>,
    secrets: BTreeMap<String, String>,
    rules: Vec<AuthRule>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            aria2c: None,
            secrets: BTreeMap::new(),
            rules: Vec::new(),
        }
    }

    /// Install a fake aria2c with this script body.
    pub fn aria2c(mut self, body: &str) -> Self {
        self.aria2c = Some(body.to_string());
        self
    }

    pub fn secret(mut self, name: &str, value: &str) -> Self {
        self.secrets.insert(name.to_string(), value.to_string());
        self
    }

    pub fn rule(mut self, rule: AuthRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Harness {
        let tmp = tempfile::tempdir().unwrap();
        let executable = self.aria2c.as_deref().map(|body| {
            #[cfg(unix)]
            {
                fake_aria2c(&tmp.path().join("bin"), body)
            }
            #[cfg(not(unix))]
            {
                let _ = body;
                tmp.path().join("bin").join("aria2c.exe")
            }
        });

        let http = reqwest::Client::new();
        let settings = DownloadSettings {
            native_poll_interval_ms: 20,
            use_multiple_interfaces: false,
            auth_rules: self.rules,
            ..DownloadSettings::default()
        };
        let deps = OrchestratorDeps {
            settings,
            http: http.clone(),
            secret_store: Arc::new(MemorySecrets(self.secrets)),
            locator: Arc::new(FixedLocator(executable)),
            header_probe: Arc::new(ReqwestHeaderProbe::new(http.clone())),
            interfaces: Arc::new(NoInterfaces),
            transfers: Arc::new(HttpTransferService::new(http)),
            log_dir: Some(tmp.path().join("logs")),
        };

        Harness {
            orchestrator: build_orchestrator(deps),
            tmp,
        }
    }
}
