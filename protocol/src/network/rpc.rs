//! # JSON-RPC Envelope
//!
//! Graphene nodes speak JSON-RPC 2.0, but almost every method is reached
//! through one wire method, `call`, whose params name the API and the
//! method inside it:
//!
//! ```text
//! {"jsonrpc":"2.0","id":7,"method":"call",
//!  "params":["database","get_required_fees",[[ops], "1.3.0"]]}
//! ```
//!
//! ## API Index
//!
//! | API                 | Methods used by the client                         |
//! |---------------------|----------------------------------------------------|
//! | `database`          | `get_chain_id`, `get_required_fees`,               |
//! |                     | `get_dynamic_global_properties`, `get_block_header`,|
//! |                     | `get_accounts`, `get_account_by_name`,             |
//! |                     | `verify_authority`                                 |
//! | `network_broadcast` | `broadcast_transaction`,                           |
//! |                     | `broadcast_transaction_synchronous`                |

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NodeError;

// ---------------------------------------------------------------------------
// API names
// ---------------------------------------------------------------------------

/// The node-side API a method belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiName {
    Database,
    NetworkBroadcast,
}

impl ApiName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiName::Database => "database",
            ApiName::NetworkBroadcast => "network_broadcast",
        }
    }
}

impl fmt::Display for ApiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Always "2.0".
    pub jsonrpc: String,
    /// Echoed back in the response.
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// Wraps `api.method(params)` into the `call` envelope.
    pub fn call(id: u64, api: ApiName, method: &str, params: serde_json::Value) -> Self {
        Self::new(id, "call", serde_json::json!([api.as_str(), method, params]))
    }

    /// `api.method` for log lines, e.g. `database.get_chain_id`.
    pub fn describe(&self) -> String {
        match self.params.as_array().map(|p| p.as_slice()) {
            Some([api, method, ..]) if self.method == "call" => format!(
                "{}.{}",
                api.as_str().unwrap_or("?"),
                method.as_str().unwrap_or("?")
            ),
            _ => self.method.clone(),
        }
    }
}

/// A JSON-RPC 2.0 response.
///
/// Exactly one of `result` or `error` is set by a conforming node. `result`
/// may legitimately be JSON `null` (e.g. an async broadcast), which serde
/// reads as `None` too, so only `error` decides failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// The result, or the node's error mapped to [`NodeError::Rpc`].
    pub fn into_result(self) -> Result<serde_json::Value, NodeError> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// The error object of a failed call.
///
/// Graphene nodes put the assertion text in `message` and a stack of
/// context in `data`; the client only surfaces the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl From<RpcError> for NodeError {
    fn from(err: RpcError) -> Self {
        NodeError::Rpc {
            code: err.code,
            message: err.message,
        }
    }
}
