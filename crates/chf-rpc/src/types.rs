//! JSON-RPC 2.0 framing shared by the exchange clients and the rating endpoint

use serde::{Deserialize, Serialize};

/// Method served by the account/balance function
pub const ACCOUNT_DEBIT_METHOD: &str = "AccountSv1.DebitRequest";

/// Method served by the rating function
pub const SERVICE_USAGE_METHOD: &str = "RatingSv1.ServiceUsage";

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    /// Application error raised by a handler
    pub const SERVER_ERROR: i32 = -32000;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<T>,
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: &str, params: T, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params: vec![params],
            id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct JsonRpcResponse<T> {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: u64,
}

impl<T> JsonRpcResponse<T> {
    pub fn success(id: u64, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wraps_params_in_array() {
        let request = JsonRpcRequest::new(SERVICE_USAGE_METHOD, serde_json::json!({"a": 1}), 7);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "RatingSv1.ServiceUsage");
        assert_eq!(json["params"][0]["a"], 1);
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_failure_omits_result() {
        let response: JsonRpcResponse<()> =
            JsonRpcResponse::failure(3, error_codes::METHOD_NOT_FOUND, "method not found");
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32601);
    }
}
