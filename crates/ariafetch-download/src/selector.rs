//! Backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use ariafetch_core::{
    AcceleratorLocator, BackendKind, BackendPreference, DownloadError, DownloadResult,
};
use tracing::info;

/// The backend chosen for an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedBackend {
    /// aria2c at this path.
    Accelerated(PathBuf),
    Native,
}

impl SelectedBackend {
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Accelerated(_) => BackendKind::Accelerated,
            Self::Native => BackendKind::Native,
        }
    }
}

/// Map a preference and the locator's answer onto a backend.
///
/// Only an explicit `Accelerated` preference turns a missing accelerator
/// into an error.
pub fn choose_backend(
    preference: BackendPreference,
    accelerator: DownloadResult<PathBuf>,
) -> DownloadResult<SelectedBackend> {
    match (preference, accelerator) {
        (BackendPreference::Native, _) => Ok(SelectedBackend::Native),
        (_, Ok(path)) => Ok(SelectedBackend::Accelerated(path)),
        (BackendPreference::Auto, Err(e)) => {
            info!(reason = %e, "aria2c unavailable, using native transfer");
            Ok(SelectedBackend::Native)
        }
        (BackendPreference::Accelerated, Err(e)) => {
            Err(DownloadError::backend_unavailable(format!("aria2c: {e}")))
        }
    }
}

/// Picks a backend per request, locating (or installing) aria2c as needed.
pub struct BackendSelector {
    locator: Arc<dyn AcceleratorLocator>,
}

impl BackendSelector {
    pub fn new(locator: Arc<dyn AcceleratorLocator>) -> Self {
        Self { locator }
    }

    pub async fn select(&self, preference: BackendPreference) -> DownloadResult<SelectedBackend> {
        if preference == BackendPreference::Native {
            return Ok(SelectedBackend::Native);
        }
        choose_backend(preference, self.locator.locate().await)
    }

    /// Forget the located executable, e.g. after it vanished mid-run.
    pub fn invalidate(&self) {
        self.locator.invalidate();
    }
}
