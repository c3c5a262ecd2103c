use ariafetch_core::{DownloadRequest, ResolvedTarget};

use crate::auth::AttemptHeaders;
use crate::options::DownloadOptions;

/// Everything an engine needs for one try at one URL.
///
/// Borrowed from the orchestrator and dropped when the attempt ends, which
/// is also the end of the credential's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    pub request: &'a DownloadRequest,
    pub target: &'a ResolvedTarget,
    pub headers: &'a AttemptHeaders,
    pub options: &'a DownloadOptions,
}

impl Attempt<'_> {
    pub fn host(&self) -> String {
        self.request.host()
    }
}
