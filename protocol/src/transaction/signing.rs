//! Transaction signing.
//!
//! Signing is a separate step from construction because the keys may not
//! be at hand when the operations are assembled. What gets signed is
//! [`Transaction::digest`]: the chain id followed by the signable bytes.

use tracing::debug;

use super::types::Transaction;
use super::TransactionError;
use crate::crypto::{sign_digest, PrivateKey};

/// Replaces the signatures on `tx` with one per distinct key in `keys`.
///
/// Fails with [`TransactionError::MissingKey`] and leaves `tx` untouched
/// when `keys` is empty.
pub fn sign_transaction(tx: &mut Transaction, chain_id: &[u8], keys: &[PrivateKey]) -> Result<(), TransactionError> {
    if keys.is_empty() {
        return Err(TransactionError::MissingKey(Vec::new()));
    }

    let digest = tx.digest(chain_id);
    let mut seen = Vec::with_capacity(keys.len());
    let mut signatures = Vec::with_capacity(keys.len());
    for key in keys {
        let public = key.public_key();
        if seen.contains(&public) {
            continue;
        }
        signatures.push(sign_digest(key, &digest)?);
        seen.push(public);
    }

    tx.signatures = signatures;
    debug!(tx_id = %tx.id(), signatures = tx.signatures.len(), "transaction signed");
    Ok(())
}
