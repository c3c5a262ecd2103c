//! aria2 JSON-RPC client.
//!
//! Speaks JSON-RPC 2.0 over HTTP to a daemon started with `--enable-rpc`.
//! Every call carries the daemon's shared secret as the leading
//! `token:<secret>` parameter.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::trace;
use url::Url;

use crate::error::{RuntimeError, RuntimeResult};

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: String,
    method: &'a str,
    params: Vec<Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Lifecycle state reported by `aria2.tellStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aria2JobState {
    Active,
    Waiting,
    Paused,
    Error,
    Complete,
    Removed,
}

impl Aria2JobState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Error | Self::Complete | Self::Removed)
    }
}

/// Subset of `aria2.tellStatus` used for progress and completion.
///
/// aria2 encodes integers as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aria2Status {
    pub gid: String,
    pub status: Aria2JobState,
    #[serde(default)]
    pub total_length: String,
    #[serde(default)]
    pub completed_length: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Aria2Status {
    pub fn completed(&self) -> u64 {
        self.completed_length.parse().unwrap_or(0)
    }

    /// Total size, `None` until aria2 knows it.
    pub fn total(&self) -> Option<u64> {
        self.total_length.parse().ok().filter(|t| *t > 0)
    }

    /// Numeric aria2 error code (same values as the process exit codes).
    pub fn error_code(&self) -> Option<i32> {
        self.error_code.as_deref().and_then(|c| c.parse().ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Aria2Version {
    pub version: String,
}

/// Client for one daemon endpoint.
pub struct Aria2RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    secret: String,
    next_id: AtomicU64,
}

impl fmt::Debug for Aria2RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aria2RpcClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl Aria2RpcClient {
    pub fn new(http: reqwest::Client, endpoint: Url, secret: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            secret: secret.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> RuntimeResult<T> {
        let mut all_params = Vec::with_capacity(params.len() + 1);
        all_params.push(Value::String(format!("token:{}", self.secret)));
        all_params.extend(params);

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
            method,
            params: all_params,
        };
        trace!(method, "aria2 RPC call");

        // aria2 answers faults with HTTP 400 and a JSON-RPC error body, so the
        // body is decoded regardless of status.
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| RuntimeError::RpcTransport(e.to_string()))?;
        let status = response.status();
        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::RpcDecode(format!("HTTP {status}: {e}")))?;

        if let Some(error) = body.error {
            return Err(RuntimeError::RpcFault {
                code: error.code,
                message: error.message,
            });
        }
        let result = body
            .result
            .ok_or_else(|| RuntimeError::RpcDecode(format!("{method}: missing result")))?;
        serde_json::from_value(result).map_err(|e| RuntimeError::RpcDecode(e.to_string()))
    }

    /// `aria2.getVersion`
    pub async fn get_version(&self) -> RuntimeResult<Aria2Version> {
        self.call("aria2.getVersion", Vec::new()).await
    }

    /// `aria2.addUri`; returns the job's GID.
    pub async fn add_uri(&self, uris: &[String], options: Map<String, Value>) -> RuntimeResult<String> {
        self.call("aria2.addUri", vec![json!(uris), Value::Object(options)])
            .await
    }

    /// `aria2.tellStatus` restricted to the fields in `Aria2Status`.
    pub async fn tell_status(&self, gid: &str) -> RuntimeResult<Aria2Status> {
        let keys = json!([
            "gid",
            "status",
            "totalLength",
            "completedLength",
            "errorCode",
            "errorMessage"
        ]);
        self.call("aria2.tellStatus", vec![json!(gid), keys]).await
    }

    /// `aria2.remove`
    pub async fn remove(&self, gid: &str) -> RuntimeResult<String> {
        self.call("aria2.remove", vec![json!(gid)]).await
    }

    /// `aria2.forceRemove`
    pub async fn force_remove(&self, gid: &str) -> RuntimeResult<String> {
        self.call("aria2.forceRemove", vec![json!(gid)]).await
    }

    /// `aria2.removeDownloadResult`, to drop a finished job from memory.
    pub async fn remove_download_result(&self, gid: &str) -> RuntimeResult<String> {
        self.call("aria2.removeDownloadResult", vec![json!(gid)])
            .await
    }

    /// `aria2.shutdown`
    pub async fn shutdown(&self) -> RuntimeResult<String> {
        self.call("aria2.shutdown", Vec::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> Aria2RpcClient {
        let endpoint = Url::parse(&format!("{}/jsonrpc", server.uri())).unwrap();
        Aria2RpcClient::new(reqwest::Client::new(), endpoint, "s3cret")
    }

    #[tokio::test]
    async fn test_add_uri_sends_token_and_returns_gid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "method": "aria2.addUri",
                "params": ["token:s3cret", ["https://example.com/a.iso"], {"out": "a.iso"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": "1", "result": "2089b05ecca3d829"
            })))
            .mount(&server)
            .await;

        let mut options = Map::new();
        options.insert("out".into(), json!("a.iso"));
        let gid = client(&server)
            .await
            .add_uri(&["https://example.com/a.iso".to_string()], options)
            .await
            .unwrap();
        assert_eq!(gid, "2089b05ecca3d829");
    }

    #[tokio::test]
    async fn test_tell_status_parses_string_numbers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": "1",
                "result": {
                    "gid": "abc", "status": "error",
                    "totalLength": "0", "completedLength": "0",
                    "errorCode": "24", "errorMessage": "Authorization failed."
                }
            })))
            .mount(&server)
            .await;

        let status = client(&server).await.tell_status("abc").await.unwrap();
        assert_eq!(status.status, Aria2JobState::Error);
        assert!(status.status.is_terminal());
        assert_eq!(status.error_code(), Some(24));
        assert_eq!(status.total(), None);
    }

    #[tokio::test]
    async fn test_fault_with_http_400() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "jsonrpc": "2.0", "id": "1",
                "error": {"code": 1, "message": "Unauthorized"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.get_version().await.unwrap_err();
        match err {
            RuntimeError::RpcFault { code, message } => {
                assert_eq!(code, 1);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let c = Aria2RpcClient::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:6800/jsonrpc").unwrap(),
            "topsecret",
        );
        assert!(!format!("{c:?}").contains("topsecret"));
    }
}
