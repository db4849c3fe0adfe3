//! # Network Module
//!
//! Everything the client asks of a node, behind one async trait.
//!
//! ## Architecture
//!
//! ```text
//! rpc.rs     — JSON-RPC 2.0 request/response types and the `call` envelope
//! http.rs    — HttpNode: ChainApi over HTTP via reqwest
//! memory.rs  — InMemoryNode: scripted in-process node for tests and demos
//! retry.rs   — RpcPolicy: per-call timeout plus bounded retry for reads
//! ```
//!
//! ## Design Decisions
//!
//! - The client never validates consensus rules. It asks the node for fees,
//!   the chain tip and account authorities, and hands signed transactions
//!   back. [`ChainApi`] is exactly that surface and nothing more.
//! - Transport errors, timeouts, node-side rejections and malformed replies
//!   are distinct [`NodeError`] variants. Only the first two are worth
//!   retrying, and only for calls that do not change chain state.
//! - Node DTOs carry just the fields the client reads; serde drops the rest.

pub mod http;
pub mod memory;
pub mod retry;
pub mod rpc;

pub use http::HttpNode;
pub use memory::InMemoryNode;
pub use retry::RpcPolicy;
pub use rpc::{ApiName, RpcError, RpcRequest, RpcResponse};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operations::Operation;
use crate::transaction::Transaction;
use crate::types::{Account, AccountId, AssetAmount, AssetId, TimePointSec, WitnessId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors talking to a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The request never got a reply (connection refused, reset, DNS).
    #[error("transport error: {0}")]
    Transport(String),

    /// No reply within the configured timeout.
    #[error("'{method}' timed out after {after:?}")]
    Timeout { method: String, after: Duration },

    /// The node answered with an error object.
    #[error("node rejected the call ({code}): {message}")]
    Rpc { code: i64, message: String },

    /// The reply did not have the expected shape.
    #[error("malformed node reply: {0}")]
    Decode(String),
}

impl NodeError {
    /// Whether repeating the same read could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NodeError::Transport(_) | NodeError::Timeout { .. })
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        NodeError::Decode(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Node DTOs
// ---------------------------------------------------------------------------

/// The slice of `2.1.0` (dynamic global properties) the client reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u32,
    /// 40 hex chars; the first 4 bytes are the block number, big-endian.
    pub head_block_id: String,
    pub time: TimePointSec,
    pub last_irreversible_block_num: u32,
}

/// A block header, as returned by `get_block_header`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Id of the block before this one.
    pub previous: String,
    pub timestamp: TimePointSec,
    #[serde(default)]
    pub witness: Option<WitnessId>,
}

/// One entry of a `get_required_fees` reply.
///
/// Plain operations get a single amount. A `proposal_create` gets its own
/// fee plus one entry per proposed operation, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeQuote {
    Single(AssetAmount),
    Nested((AssetAmount, Vec<FeeQuote>)),
}

impl FeeQuote {
    /// The fee of the operation itself, ignoring any inner quotes.
    pub fn amount(&self) -> &AssetAmount {
        match self {
            FeeQuote::Single(fee) => fee,
            FeeQuote::Nested((fee, _)) => fee,
        }
    }
}

/// Where a synchronously broadcast transaction landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfirmation {
    pub id: String,
    pub block_num: u32,
    pub trx_num: u32,
}

// ---------------------------------------------------------------------------
// The contract
// ---------------------------------------------------------------------------

/// The node operations the client depends on.
///
/// Implementations do no retrying or timing out of their own beyond what
/// the transport needs; [`RpcPolicy`] wraps calls at the call site.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Hex chain id of the network the node follows.
    async fn get_chain_id(&self) -> Result<String, NodeError>;

    /// Fees for `ops`, quoted in `fee_asset`, one entry per op in order.
    async fn get_required_fees(&self, ops: &[Operation], fee_asset: AssetId) -> Result<Vec<FeeQuote>, NodeError>;

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, NodeError>;

    /// `None` if the node does not have the block.
    async fn get_block_header(&self, block_num: u32) -> Result<Option<BlockHeader>, NodeError>;

    /// One entry per requested id, `None` for unknown accounts.
    async fn get_accounts(&self, ids: &[AccountId]) -> Result<Vec<Option<Account>>, NodeError>;

    async fn get_account_by_name(&self, name: &str) -> Result<Option<Account>, NodeError>;

    /// Fire-and-forget submission.
    async fn broadcast_transaction(&self, tx: &Transaction) -> Result<(), NodeError>;

    /// Submission that returns once the transaction is in a block.
    async fn broadcast_transaction_synchronous(&self, tx: &Transaction) -> Result<BroadcastConfirmation, NodeError>;

    /// Whether the signatures on `tx` satisfy every authority it needs.
    async fn verify_authority(&self, tx: &Transaction) -> Result<bool, NodeError>;
}

/// Reference-block fields from a block id: the low 16 bits of its number
/// and bytes 4..8 read little-endian.
pub fn ref_block_fields(block_id: &str) -> Result<(u16, u32), NodeError> {
    let bytes = hex::decode(block_id).map_err(|e| NodeError::Decode(format!("block id '{block_id}': {e}")))?;
    if bytes.len() < 8 {
        return Err(NodeError::Decode(format!("block id '{block_id}' is too short")));
    }
    let num = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let prefix = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    Ok(((num & 0xFFFF) as u16, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_block_fields() {
        let (num, prefix) = ref_block_fields("000085f685abf4dc0000000000000000000000ff").unwrap();
        assert_eq!(num, 34294);
        assert_eq!(prefix, 3_707_022_213);

        // Only the low 16 bits of the number survive.
        let (num, _) = ref_block_fields("0001000100000000").unwrap();
        assert_eq!(num, 1);

        assert!(ref_block_fields("00").is_err());
        assert!(ref_block_fields("zz").is_err());
    }

    #[test]
    fn test_fee_quote_shapes() {
        let quotes: Vec<FeeQuote> = serde_json::from_value(serde_json::json!([
            {"amount": 100000, "asset_id": "1.3.0"},
            [{"amount": 2000, "asset_id": "1.3.0"}, [{"amount": 5, "asset_id": "1.3.0"}]]
        ]))
        .unwrap();
        assert_eq!(quotes[0], FeeQuote::Single(AssetAmount::new(100_000, AssetId::CORE)));
        match &quotes[1] {
            FeeQuote::Nested((fee, inner)) => {
                assert_eq!(fee.amount, 2000);
                assert_eq!(inner[0].amount().amount, 5);
            }
            other => panic!("expected a nested quote, got {other:?}"),
        }
    }

    #[test]
    fn test_dynamic_properties_ignore_extra_fields() {
        let props: DynamicGlobalProperties = serde_json::from_value(serde_json::json!({
            "id": "2.1.0",
            "head_block_number": 34294,
            "head_block_id": "000085f685abf4dc0000000000000000000000ff",
            "time": "2016-04-06T08:29:00",
            "current_witness": "1.6.12",
            "last_irreversible_block_num": 34280
        }))
        .unwrap();
        assert_eq!(props.last_irreversible_block_num, 34280);
    }

    #[test]
    fn test_only_transport_failures_retry() {
        assert!(NodeError::Transport("reset".into()).is_retryable());
        assert!(NodeError::Timeout {
            method: "get_chain_id".into(),
            after: Duration::from_secs(1)
        }
        .is_retryable());
        assert!(!NodeError::Rpc { code: 1, message: "no".into() }.is_retryable());
        assert!(!NodeError::Decode("bad".into()).is_retryable());
    }
}
