//! # Hashing Utilities
//!
//! The handful of hash functions Graphene leans on. We support exactly the
//! ones the node uses and refuse to grow the list without a reason:
//!
//! - **SHA-256**: signing digests (`SHA256(chain_id || tx)`), transaction
//!   ids, memo checksums, WIF and BIP38 checksums (doubled).
//! - **SHA-512**: memo key derivation, and the first step of an address.
//! - **RIPEMD-160**: public key checksums and addresses.
//!
//! All functions return fixed-size arrays. Callers that want a `Vec` can
//! call `.to_vec()`, which is rarer than you'd think.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

/// SHA-256 of `data`.
///
/// # Example
///
/// ```
/// use graphene_protocol::crypto::sha256;
///
/// let hash = sha256(b"graphene");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 over several slices without concatenating them first.
///
/// The signing digest is `SHA256(chain_id || tx)` and building that buffer
/// just to hash it would be a pointless copy.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// `SHA256(SHA256(data))`. Used for WIF and BIP38 checksums, the same way
/// Bitcoin does it.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// SHA-512 of `data`.
pub fn sha512(data: &[u8]) -> [u8; 64] {
    Sha512::digest(data).into()
}

/// RIPEMD-160 of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Bitcoin's `hash160`: `RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}
