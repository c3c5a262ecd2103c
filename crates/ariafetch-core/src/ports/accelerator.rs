//! Accelerator locator port.
//!
//! Implementations find (and may lazily install) the accelerator
//! executable. Lookups are cached by the implementation in an explicit
//! cache object with `invalidate`.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::DownloadResult;

#[async_trait]
pub trait AcceleratorLocator: Send + Sync {
    /// Path to a runnable accelerator.
    ///
    /// Fails with `ExecutableNotFound` when it is missing and cannot be
    /// installed.
    async fn locate(&self) -> DownloadResult<PathBuf>;

    /// Forget any cached lookup so the next `locate` searches again.
    fn invalidate(&self);
}
