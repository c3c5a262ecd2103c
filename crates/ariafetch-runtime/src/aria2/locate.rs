//! Locating the `aria2c` executable.
//!
//! Lookup order:
//! 1. Explicitly configured path (no further search if it is missing)
//! 2. `<tools_dir>/aria2c[.exe]` (where the installer puts it)
//! 3. `PATH`
//! 4. Installing the pinned release, when enabled
//!
//! The first hit is memoised in a `ToolCache` owned by the locator.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ariafetch_core::{AcceleratorLocator, DownloadResult, accelerator_file_name};
use async_trait::async_trait;
use tracing::{debug, info};

use super::install::Aria2Installer;
use crate::error::RuntimeError;

/// Per-process cache of a located tool path.
#[derive(Debug, Default)]
pub struct ToolCache {
    path: Mutex<Option<PathBuf>>,
}

impl ToolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<PathBuf> {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, path: PathBuf) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }

    pub fn invalidate(&self) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Finds (and optionally installs) `aria2c`.
pub struct Aria2Locator {
    explicit: Option<PathBuf>,
    tools_dir: PathBuf,
    search_path: bool,
    installer: Option<Aria2Installer>,
    cache: ToolCache,
}

impl Aria2Locator {
    pub fn new(tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            explicit: None,
            tools_dir: tools_dir.into(),
            search_path: true,
            installer: None,
            cache: ToolCache::new(),
        }
    }

    #[must_use]
    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Install the pinned release when nothing else is found.
    #[must_use]
    pub fn with_installer(mut self, installer: Aria2Installer) -> Self {
        self.installer = Some(installer);
        self
    }

    /// Skip the `PATH` lookup. Used by tests to keep the host's aria2c out.
    #[must_use]
    pub const fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    fn is_runnable(path: &Path) -> bool {
        path.is_file()
    }

    fn find_without_install(&self) -> Result<Option<PathBuf>, RuntimeError> {
        if let Some(explicit) = &self.explicit {
            if Self::is_runnable(explicit) {
                return Ok(Some(explicit.clone()));
            }
            return Err(RuntimeError::NotInstalled {
                searched: explicit.display().to_string(),
            });
        }

        let bundled = self.tools_dir.join(accelerator_file_name());
        if Self::is_runnable(&bundled) {
            return Ok(Some(bundled));
        }

        if self.search_path {
            if let Ok(found) = which::which("aria2c") {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    async fn find(&self) -> Result<PathBuf, RuntimeError> {
        if let Some(path) = self.find_without_install()? {
            return Ok(path);
        }

        if let Some(installer) = &self.installer {
            info!("aria2c not found, installing pinned release");
            return installer.install(false).await;
        }

        Err(RuntimeError::NotInstalled {
            searched: format!("{} and PATH", self.tools_dir.display()),
        })
    }
}

#[async_trait]
impl AcceleratorLocator for Aria2Locator {
    async fn locate(&self) -> DownloadResult<PathBuf> {
        if let Some(cached) = self.cache.get() {
            if cached.is_file() {
                return Ok(cached);
            }
            self.cache.invalidate();
        }

        let path = self.find().await?;
        debug!(path = %path.display(), "Located aria2c");
        self.cache.set(path.clone());
        Ok(path)
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }
}
