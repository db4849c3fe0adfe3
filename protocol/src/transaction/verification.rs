//! Local signature checks.
//!
//! The node is the authority on whether a transaction is sufficiently
//! signed. These helpers answer the narrower question of who signed it,
//! which is enough to catch a wrong chain id or a missing key before a
//! round-trip.

use super::types::Transaction;
use crate::crypto::{recover_with_prefix, verify, PublicKey, SignatureError};

/// The public key behind every signature on `tx`, in signature order.
pub fn recover_signers(tx: &Transaction, chain_id: &[u8], prefix: &str) -> Result<Vec<PublicKey>, SignatureError> {
    let digest = tx.digest(chain_id);
    tx.signatures
        .iter()
        .map(|sig| recover_with_prefix(sig, &digest, prefix))
        .collect()
}

/// Whether one of the signatures on `tx` was made by `key`.
pub fn verify_signed_by(tx: &Transaction, chain_id: &[u8], key: &PublicKey) -> bool {
    let digest = tx.digest(chain_id);
    tx.signatures.iter().any(|sig| verify(key, &digest, sig))
}
