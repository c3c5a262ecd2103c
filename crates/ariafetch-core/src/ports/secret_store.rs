//! Secret store port.
//!
//! The download subsystem only ever reads secrets, and only to build an
//! `Authorization` header. Storage, rotation and access control belong to
//! the adapter.

use std::fmt;

use async_trait::async_trait;

use crate::errors::DownloadResult;

/// A plaintext secret. `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the plaintext. Call sites must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Read access to named secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret by name. `Ok(None)` means no such secret is configured.
    async fn get_secret(&self, name: &str) -> DownloadResult<Option<SecretValue>>;
}

/// A secret store with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSecretStore;

#[async_trait]
impl SecretStore for NoopSecretStore {
    async fn get_secret(&self, _name: &str) -> DownloadResult<Option<SecretValue>> {
        Ok(None)
    }
}
