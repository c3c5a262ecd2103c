//! Environment-backed secret store.

use std::fmt;

use ariafetch_core::{DownloadResult, SecretStore, SecretValue};
use async_trait::async_trait;

/// Prefix of the environment variables holding secrets.
pub const SECRET_ENV_PREFIX: &str = "ARIAFETCH_SECRET_";

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads secret `name` from `ARIAFETCH_SECRET_<NAME>`.
pub struct EnvSecretStore {
    lookup: Lookup,
}

impl EnvSecretStore {
    /// Store backed by the process environment.
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Store backed by an arbitrary variable lookup.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSecretStore").finish_non_exhaustive()
    }
}

/// Environment variable name for secret `name`.
pub fn secret_env_var(name: &str) -> String {
    let suffix: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '-' | '.' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    format!("{SECRET_ENV_PREFIX}{suffix}")
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> DownloadResult<Option<SecretValue>> {
        Ok((self.lookup)(&secret_env_var(name))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(SecretValue::new))
    }
}
