//! JSON-RPC 2.0 client over HTTP
//!
//! Low-level request/response primitive used by the account debit and
//! rating exchanges.

use chf_core::ChargingError;
use reqwest::{Client, ClientBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::types::{JsonRpcRequest, JsonRpcResponse};

/// Fallback Origin-Host when the machine hostname cannot be read
const DEFAULT_ORIGIN_HOST: &str = "chf";

pub struct JsonRpcClient {
    http_client: Client,
    base_url: String,
    timeout_ms: u64,
    request_id: AtomicU64,
}

/// Errors of the JSON-RPC client
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error: status {0}")]
    HttpError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),

    #[error("Empty response from peer")]
    EmptyResponse,

    #[error("Timeout: request took longer than {0}ms")]
    Timeout(u64),
}

impl From<RpcError> for ChargingError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Timeout(ms) => ChargingError::Timeout(ms),
            RpcError::RpcError(code, message) => ChargingError::RpcStatus { code, message },
            other => ChargingError::Rpc(other.to_string()),
        }
    }
}

impl JsonRpcClient {
    /// Create a client for one JSON-RPC endpoint
    ///
    /// # Arguments
    ///
    /// * `base_url` - endpoint URL (e.g. "http://127.0.0.1:2080/jsonrpc")
    /// * `timeout_ms` - per-request timeout in milliseconds
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, RpcError> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| RpcError::Connection(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.to_string(),
            timeout_ms,
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute one JSON-RPC call
    #[instrument(skip(self, params), fields(method = %method))]
    pub async fn call<T, R>(&self, method: &str, params: T) -> Result<R, RpcError>
    where
        T: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let request_id = self.next_id();
        let request = JsonRpcRequest::new(method, params, request_id);

        debug!("JSON-RPC request: method={}, id={}", method, request_id);

        let response = self
            .http_client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout(self.timeout_ms)
                } else {
                    RpcError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("JSON-RPC HTTP error: status={}", status);
            return Err(RpcError::HttpError(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Timeout(self.timeout_ms)
            } else {
                RpcError::ParseError(format!("Failed to read response body: {}", e))
            }
        })?;

        debug!("JSON-RPC response: {}", body);

        let rpc_response: JsonRpcResponse<R> = serde_json::from_str(&body).map_err(|e| {
            RpcError::ParseError(format!("Failed to parse JSON: {} - Body: {}", e, body))
        })?;

        if let Some(err) = rpc_response.error {
            return Err(RpcError::RpcError(err.code, err.message));
        }

        rpc_response.result.ok_or(RpcError::EmptyResponse)
    }
}

/// Origin-Host for outgoing exchanges: the configured value or the machine hostname
pub fn resolve_origin_host(configured: Option<&str>) -> String {
    match configured {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| DEFAULT_ORIGIN_HOST.to_string()),
    }
}
