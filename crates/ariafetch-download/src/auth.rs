//! Private-repository authentication.
//!
//! Tokens are fetched from the `SecretStore` per attempt and only ever
//! live inside the header map built for that attempt.
//!
//! # Design
//!
//! - A host matching an `AuthRule` looks up the rule's secret
//! - A request naming its own secret uses that secret for any host
//! - A caller-supplied `Authorization` header wins and skips the lookup
//! - A missing secret is not an error; the request goes out unauthenticated

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ariafetch_core::{AuthRule, DownloadRequest, SecretStore, SecretValue};
use tracing::{debug, warn};

const AUTHORIZATION: &str = "Authorization";
const ACCEPT: &str = "Accept";
const OCTET_STREAM: &str = "application/octet-stream";

/// Header set for one attempt, possibly carrying a credential.
#[derive(Clone, Default)]
pub struct AttemptHeaders {
    headers: BTreeMap<String, String>,
    authenticated: bool,
    requires_auth: bool,
}

impl AttemptHeaders {
    pub const fn as_map(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Whether a token was attached.
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the host is a configured authenticated API host.
    ///
    /// A 404 from such a host usually means a private resource.
    pub const fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}

impl fmt::Debug for AttemptHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptHeaders")
            .field("names", &self.headers.keys().collect::<Vec<_>>())
            .field("authenticated", &self.authenticated)
            .field("requires_auth", &self.requires_auth)
            .finish()
    }
}

/// Resolves tokens for hosts that need them.
pub struct RepoAuthenticator {
    store: Arc<dyn SecretStore>,
    rules: Vec<AuthRule>,
}

impl RepoAuthenticator {
    pub fn new(store: Arc<dyn SecretStore>, rules: Vec<AuthRule>) -> Self {
        Self { store, rules }
    }

    fn rule_for(&self, host: &str) -> Option<&AuthRule> {
        self.rules.iter().find(|rule| rule.matches(host))
    }

    /// Token for the request's host, if one is configured and stored.
    ///
    /// Secret store failures are logged and treated as "no token".
    pub async fn resolve_token(&self, request: &DownloadRequest) -> Option<SecretValue> {
        let host = request.host();
        let name = match (request.auth_secret(), self.rule_for(&host)) {
            (Some(explicit), _) => explicit.name().to_string(),
            (None, Some(rule)) => rule.secret_name.clone(),
            (None, None) => return None,
        };

        match self.store.get_secret(&name).await {
            Ok(Some(secret)) if !secret.is_empty() => {
                debug!(%host, secret = %name, "Using stored token");
                Some(secret)
            }
            Ok(_) => {
                debug!(%host, secret = %name, "No token stored, continuing unauthenticated");
                None
            }
            Err(e) => {
                warn!(%host, secret = %name, error = %e, "Secret store lookup failed");
                None
            }
        }
    }

    /// The request's headers plus any credential headers for its host.
    pub async fn headers_for(&self, request: &DownloadRequest) -> AttemptHeaders {
        let host = request.host();
        let rule = self.rule_for(&host);
        let mut headers = request.headers().clone();
        let requires_auth = rule.is_some();

        if has_header(&headers, AUTHORIZATION) {
            return AttemptHeaders {
                headers,
                authenticated: true,
                requires_auth,
            };
        }

        let Some(token) = self.resolve_token(request).await else {
            return AttemptHeaders {
                headers,
                authenticated: false,
                requires_auth,
            };
        };

        headers.insert(
            AUTHORIZATION.to_string(),
            format!("token {}", token.expose()),
        );
        if rule.is_some_and(|r| r.accept_octet_stream) && !has_header(&headers, ACCEPT) {
            headers.insert(ACCEPT.to_string(), OCTET_STREAM.to_string());
        }

        AttemptHeaders {
            headers,
            authenticated: true,
            requires_auth,
        }
    }
}

fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}
