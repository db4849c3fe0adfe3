//! [`ChainApi`] over HTTP.
//!
//! One POST per call, JSON-RPC 2.0 `call` envelope, request ids from an
//! atomic counter. No connection state beyond what reqwest pools.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::rpc::{ApiName, RpcRequest, RpcResponse};
use super::{BlockHeader, BroadcastConfirmation, ChainApi, DynamicGlobalProperties, FeeQuote, NodeError};
use crate::config::DEFAULT_RPC_TIMEOUT;
use crate::operations::Operation;
use crate::transaction::Transaction;
use crate::types::{Account, AccountId, AssetId};

/// A node reached over HTTP.
pub struct HttpNode {
    http_client: reqwest::Client,
    url: String,
    timeout: Duration,
    request_id: AtomicU64,
}

impl HttpNode {
    /// A client for `url` with the default timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, NodeError> {
        Self::with_timeout(url, DEFAULT_RPC_TIMEOUT)
    }

    /// A client for `url` whose transport gives up after `timeout`.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, NodeError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            url: url.into(),
            timeout,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends `api.method(params)` and decodes the result as `R`.
    async fn call<R: DeserializeOwned>(
        &self,
        api: ApiName,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, NodeError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest::call(id, api, method, params);
        debug!(id, call = %request.describe(), "rpc request");

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NodeError::Timeout {
                        method: method.to_string(),
                        after: self.timeout,
                    }
                } else {
                    NodeError::Transport(e.to_string())
                }
            })?;

        let reply: RpcResponse = response
            .json()
            .await
            .map_err(|e| NodeError::Decode(format!("{method}: {e}")))?;
        Ok(serde_json::from_value(reply.into_result()?)?)
    }
}

#[async_trait]
impl ChainApi for HttpNode {
    async fn get_chain_id(&self) -> Result<String, NodeError> {
        self.call(ApiName::Database, "get_chain_id", json!([])).await
    }

    async fn get_required_fees(&self, ops: &[Operation], fee_asset: AssetId) -> Result<Vec<FeeQuote>, NodeError> {
        self.call(ApiName::Database, "get_required_fees", json!([ops, fee_asset]))
            .await
    }

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, NodeError> {
        self.call(ApiName::Database, "get_dynamic_global_properties", json!([]))
            .await
    }

    async fn get_block_header(&self, block_num: u32) -> Result<Option<BlockHeader>, NodeError> {
        self.call(ApiName::Database, "get_block_header", json!([block_num]))
            .await
    }

    async fn get_accounts(&self, ids: &[AccountId]) -> Result<Vec<Option<Account>>, NodeError> {
        self.call(ApiName::Database, "get_accounts", json!([ids])).await
    }

    async fn get_account_by_name(&self, name: &str) -> Result<Option<Account>, NodeError> {
        self.call(ApiName::Database, "get_account_by_name", json!([name]))
            .await
    }

    async fn broadcast_transaction(&self, tx: &Transaction) -> Result<(), NodeError> {
        let _: serde_json::Value = self
            .call(ApiName::NetworkBroadcast, "broadcast_transaction", json!([tx]))
            .await?;
        Ok(())
    }

    async fn broadcast_transaction_synchronous(&self, tx: &Transaction) -> Result<BroadcastConfirmation, NodeError> {
        self.call(
            ApiName::NetworkBroadcast,
            "broadcast_transaction_synchronous",
            json!([tx]),
        )
        .await
    }

    async fn verify_authority(&self, tx: &Transaction) -> Result<bool, NodeError> {
        // The node asserts instead of answering false.
        match self
            .call(ApiName::Database, "verify_authority", json!([tx]))
            .await
        {
            Err(NodeError::Rpc { message, .. }) => {
                debug!(%message, "verify_authority rejected");
                Ok(false)
            }
            other => other,
        }
    }
}
