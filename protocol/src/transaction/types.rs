//! The transaction container.
//!
//! A transaction is a header (reference block, expiration), a list of
//! operations and the signatures over all of it. What gets signed is the
//! encoding *without* the signatures, prefixed with the chain id, so the
//! same operations signed for mainnet are worthless on a testnet.

use crate::codec::Encode;
use crate::crypto::{sha256, sha256_concat, CompactSignature};
use crate::config::TRANSACTION_ID_LENGTH;
use crate::operations::Operation;
use crate::types::{Extensions, TimePointSec};

graphene_object! {
    /// A (possibly signed) transaction.
    ///
    /// The canonical encoding produced by [`Encode`] is the *signed* form,
    /// i.e. it ends with the signature list. [`Transaction::signable_bytes`]
    /// is the form that signatures and ids are computed over.
    pub struct Transaction {
        /// Low 16 bits of the reference block number.
        pub ref_block_num: u16,
        /// Bytes 4..8 of the reference block id, read little-endian.
        pub ref_block_prefix: u32,
        pub expiration: TimePointSec,
        pub operations: Vec<Operation>,
        #[serde(default)]
        pub extensions: Extensions,
        #[serde(default)]
        pub signatures: Vec<CompactSignature>,
    }
}

impl Transaction {
    /// An unsigned transaction over `operations`.
    pub fn new(
        ref_block_num: u16,
        ref_block_prefix: u32,
        expiration: TimePointSec,
        operations: Vec<Operation>,
    ) -> Self {
        Self {
            ref_block_num,
            ref_block_prefix,
            expiration,
            operations,
            extensions: Extensions,
            signatures: Vec::new(),
        }
    }

    /// Canonical encoding of everything except the signatures.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        self.ref_block_num.encode(&mut out);
        self.ref_block_prefix.encode(&mut out);
        self.expiration.encode(&mut out);
        self.operations.encode(&mut out);
        self.extensions.encode(&mut out);
        out
    }

    /// `SHA256(chain_id || signable_bytes)`: what every signature signs.
    pub fn digest(&self, chain_id: &[u8]) -> [u8; 32] {
        sha256_concat(&[chain_id, &self.signable_bytes()])
    }

    /// Transaction id as the node reports it: hex of the first 20 bytes of
    /// `SHA256(signable_bytes)`. Signatures do not affect it.
    pub fn id(&self) -> String {
        hex::encode(&sha256(&self.signable_bytes())[..TRANSACTION_ID_LENGTH])
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Size of the signed encoding in bytes.
    pub fn size_bytes(&self) -> usize {
        self.to_bytes().len()
    }

    /// JSON form as the node accepts it.
    pub fn to_json(&self) -> serde_json::Value {
        // Every field serializes to plain JSON, so this cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
