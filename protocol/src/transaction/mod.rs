//! # Transaction Module
//!
//! Assembly, fee injection, signing and submission of transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — Transaction: signable bytes, digest, id, JSON
//! fees.rs         — batch fee query and in-place fee injection
//! proposal.rs     — ProposalBuilder: wraps operations into proposal_create
//! signing.rs      — canonical recoverable signatures over the digest
//! verification.rs — signer recovery and local signature checks
//! builder.rs      — TransactionBuilder: the Empty → … → Discarded state machine
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Append** operations and signers to a [`TransactionBuilder`].
//! 2. **Construct** — bind the reference block and expiration, fetch fees.
//! 3. **Sign** — one signature per resolved key over
//!    `SHA256(chain_id || signable_bytes)`.
//! 4. **Broadcast** — hand it to the node, or back to the caller when
//!    `nobroadcast` is set. Either way the builder is spent afterwards.
//!
//! ## Design Decisions
//!
//! - Every failure is a [`TransactionError`] variant; nothing here panics on
//!   bad input.
//! - A broadcast is never retried. A timed-out broadcast may well have
//!   landed, and re-sending it can only be rejected as a duplicate.
//! - Appending after fees were resolved drops the signatures and sends the
//!   builder back to construction, so a signed transaction can never carry
//!   operations its signers did not see.

pub mod builder;
pub mod fees;
pub mod proposal;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{BroadcastOutcome, BuilderState, TransactionBuilder};
pub use fees::assemble_fees;
pub use proposal::ProposalBuilder;
pub use signing::sign_transaction;
pub use types::Transaction;
pub use verification::{recover_signers, verify_signed_by};

use std::time::Duration;

use thiserror::Error;

use crate::codec::CodecError;
use crate::crypto::{PublicKey, SignatureError};
use crate::network::NodeError;
use crate::operations::OperationError;
use crate::resolver::ResolverError;
use crate::types::AuthorityError;
use crate::vault::KeyStoreError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while assembling, signing or submitting a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The fee reply does not line up with the operations sent.
    #[error("fee oracle: {0}")]
    FeeOracle(String),

    /// No private key is available to sign with.
    #[error("no private key available to sign{}", fmt_missing(.0))]
    MissingKey(Vec<PublicKey>),

    /// `construct` or `broadcast` with nothing to send.
    #[error("transaction has no operations")]
    NoOperations,

    /// The node refused the transaction.
    #[error("broadcast failed: {0}")]
    Broadcast(#[source] NodeError),

    /// The node says the signatures do not satisfy the required authorities.
    #[error("signatures do not satisfy the required authorities")]
    InsufficientAuthority,

    /// A node call did not finish in time.
    #[error("'{method}' timed out after {after:?}")]
    Timeout { method: String, after: Duration },

    /// The builder cannot do that in its current state.
    #[error("cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    /// A signer or proposer that the node does not know.
    #[error("account {0} does not exist")]
    UnknownAccount(String),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The node follows a different chain than the client was set up for.
    #[error("chain id mismatch: expected {expected}, node reports {found}")]
    ChainMismatch { expected: String, found: String },

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error("node error: {0}")]
    Node(NodeError),

    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

fn fmt_missing(keys: &[PublicKey]) -> String {
    if keys.is_empty() {
        String::new()
    } else {
        let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
        format!(" (wanted one of: {})", keys.join(", "))
    }
}

impl From<NodeError> for TransactionError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Timeout { method, after } => TransactionError::Timeout { method, after },
            other => TransactionError::Node(other),
        }
    }
}

impl From<ResolverError> for TransactionError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::Node(e) => e.into(),
            ResolverError::KeyStore(e) => TransactionError::KeyStore(e),
            ResolverError::UnknownAccount(id) => TransactionError::UnknownAccount(id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    #[test]
    fn test_node_timeout_surfaces_as_timeout() {
        let err: TransactionError = NodeError::Timeout {
            method: "get_required_fees".into(),
            after: Duration::from_secs(10),
        }
        .into();
        assert!(matches!(err, TransactionError::Timeout { ref method, .. } if method == "get_required_fees"));

        let err: TransactionError = NodeError::Transport("reset".into()).into();
        assert!(matches!(err, TransactionError::Node(_)));
    }

    #[test]
    fn test_missing_key_message_names_candidates() {
        assert_eq!(
            TransactionError::MissingKey(vec![]).to_string(),
            "no private key available to sign"
        );
        let key = PrivateKey::from_seed("alice").unwrap().public_key();
        let msg = TransactionError::MissingKey(vec![key.clone()]).to_string();
        assert!(msg.contains(&key.to_string()));
    }
}
