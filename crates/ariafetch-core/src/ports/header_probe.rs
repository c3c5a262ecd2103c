//! Header probe port used by filename resolution.

use std::collections::BTreeMap;

use async_trait::async_trait;
use url::Url;

use crate::errors::DownloadResult;

/// Response headers as `(name, value)` pairs in wire order.
pub type HeaderPairs = Vec<(String, String)>;

#[async_trait]
pub trait HeaderProbe: Send + Sync {
    /// Issue a `HEAD` request and return the response headers.
    async fn head(&self, url: &Url, headers: &BTreeMap<String, String>)
    -> DownloadResult<HeaderPairs>;
}
