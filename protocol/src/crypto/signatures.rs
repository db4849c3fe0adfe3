//! # Digital Signatures
//!
//! Recoverable secp256k1 ECDSA, in the exact shape a Graphene node verifies.
//!
//! The node never receives public keys alongside a transaction. It recovers
//! each signer's key from the signature and the digest, then checks the
//! recovered set against the required authorities. So every signature we
//! produce must be:
//!
//! 1. **Recoverable**: 65 bytes: `27 + 4 + recid`, then `r`, then `s`.
//! 2. **Canonical**: the node's `is_canonical` check rejects any signature
//!    whose `r` or `s` has the high bit set, or has a redundant leading zero
//!    byte. About one signature in four fails that test.
//!
//! Signing is deterministic (RFC 6979). When the result is not canonical we
//! re-sign with an incrementing counter as extra nonce data until it is.
//! The same key, digest and counter always produce the same signature, so
//! signing stays reproducible.

use std::fmt;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SECP256K1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keys::{PrivateKey, PublicKey};
use crate::codec::{CodecError, Decode, Encode, Reader};
use crate::config::{
    DEFAULT_ADDRESS_PREFIX, MAX_CANONICAL_SIGNING_ATTEMPTS, SIGNATURE_LENGTH,
    SIGNATURE_RECOVERY_OFFSET,
};

/// Errors during signature operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("invalid signature bytes: expected {SIGNATURE_LENGTH} bytes")]
    InvalidSignatureBytes,

    #[error("invalid recovery header byte {0}")]
    InvalidRecoveryId(u8),

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("no canonical signature after {0} attempts")]
    NonCanonical(u32),
}

/// A 65-byte recoverable signature as serialized on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactSignature([u8; SIGNATURE_LENGTH]);

impl CompactSignature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let arr: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidSignatureBytes)?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(s).map_err(|_| SignatureError::InvalidSignatureBytes)?;
        Self::from_slice(&bytes)
    }

    /// Whether the node's `is_canonical` check would accept this signature.
    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.0[1..])
    }

    fn to_recoverable(&self) -> Result<RecoverableSignature, SignatureError> {
        let header = self.0[0];
        let recid = header
            .checked_sub(SIGNATURE_RECOVERY_OFFSET)
            .filter(|id| *id < 4)
            .ok_or(SignatureError::InvalidRecoveryId(header))?;
        let recid = RecoveryId::from_i32(i32::from(recid))
            .map_err(|_| SignatureError::InvalidRecoveryId(header))?;
        RecoverableSignature::from_compact(&self.0[1..], recid)
            .map_err(|_| SignatureError::InvalidSignatureBytes)
    }
}

impl fmt::Display for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "CompactSignature({}...{})", &hex_str[..8], &hex_str[122..])
    }
}

impl Encode for CompactSignature {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

impl Decode for CompactSignature {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self(reader.take_array()?))
    }
}

impl Serialize for CompactSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CompactSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The node's canonicality rule over a 64-byte `r || s`.
fn is_canonical(c: &[u8]) -> bool {
    c[0] & 0x80 == 0
        && !(c[0] == 0 && c[1] & 0x80 == 0)
        && c[32] & 0x80 == 0
        && !(c[32] == 0 && c[33] & 0x80 == 0)
}

/// Signs a 32-byte digest, retrying until the signature is canonical.
///
/// # Example
///
/// ```
/// use graphene_protocol::crypto::{sha256, sign_digest, recover, PrivateKey};
///
/// let key = PrivateKey::generate();
/// let digest = sha256(b"payload");
/// let sig = sign_digest(&key, &digest).unwrap();
/// assert!(sig.is_canonical());
/// assert_eq!(recover(&sig, &digest).unwrap(), key.public_key());
/// ```
pub fn sign_digest(key: &PrivateKey, digest: &[u8; 32]) -> Result<CompactSignature, SignatureError> {
    let message = Message::from_digest(*digest);
    for attempt in 0..MAX_CANONICAL_SIGNING_ATTEMPTS {
        let sig = if attempt == 0 {
            SECP256K1.sign_ecdsa_recoverable(&message, key.secret())
        } else {
            let mut noncedata = [0u8; 32];
            noncedata[..4].copy_from_slice(&attempt.to_le_bytes());
            SECP256K1.sign_ecdsa_recoverable_with_noncedata(&message, key.secret(), &noncedata)
        };
        let (recid, compact) = sig.serialize_compact();
        if !is_canonical(&compact) {
            continue;
        }
        let mut out = [0u8; SIGNATURE_LENGTH];
        // recid is 0..=3, so the header always fits.
        out[0] = SIGNATURE_RECOVERY_OFFSET + recid.to_i32() as u8;
        out[1..].copy_from_slice(&compact);
        return Ok(CompactSignature(out));
    }
    Err(SignatureError::NonCanonical(MAX_CANONICAL_SIGNING_ATTEMPTS))
}

/// Recovers the signer's public key from a signature and the digest it signs.
pub fn recover(sig: &CompactSignature, digest: &[u8; 32]) -> Result<PublicKey, SignatureError> {
    recover_with_prefix(sig, digest, DEFAULT_ADDRESS_PREFIX)
}

/// [`recover`], tagging the key with a chain-specific prefix.
pub fn recover_with_prefix(
    sig: &CompactSignature,
    digest: &[u8; 32],
    prefix: &str,
) -> Result<PublicKey, SignatureError> {
    let message = Message::from_digest(*digest);
    let recoverable = sig.to_recoverable()?;
    SECP256K1
        .recover_ecdsa(&message, &recoverable)
        .map(|key| PublicKey::from_secp(key, prefix))
        .map_err(|_| SignatureError::RecoveryFailed)
}

/// Plain ECDSA verification against a known public key.
///
/// Ignores the recovery header, so this is exactly what a standard verifier
/// would do with `r || s`.
pub fn verify(public_key: &PublicKey, digest: &[u8; 32], sig: &CompactSignature) -> bool {
    let Ok(recoverable) = sig.to_recoverable() else {
        return false;
    };
    let message = Message::from_digest(*digest);
    SECP256K1
        .verify_ecdsa(&message, &recoverable.to_standard(), public_key.secp())
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::sha256;

    fn key(seed: &str) -> PrivateKey {
        PrivateKey::from_seed(seed).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let k = key("alice");
        let digest = sha256(b"hello, graphene");
        let sig = sign_digest(&k, &digest).unwrap();
        assert!(verify(&k.public_key(), &digest, &sig));
    }

    #[test]
    fn test_signature_layout() {
        let k = key("alice");
        let sig = sign_digest(&k, &sha256(b"layout")).unwrap();
        let header = sig.as_bytes()[0];
        assert!((31..=34).contains(&header), "header was {header}");
        assert!(sig.is_canonical());
    }

    #[test]
    fn test_recovery_returns_signer() {
        for seed in ["alice", "bob", "carol", "dave"] {
            let k = key(seed);
            let digest = sha256(seed.as_bytes());
            let sig = sign_digest(&k, &digest).unwrap();
            assert_eq!(recover(&sig, &digest).unwrap(), k.public_key());
        }
    }

    #[test]
    fn test_recover_with_prefix_labels_key() {
        let k = key("erin");
        let digest = sha256(b"prefixed");
        let sig = sign_digest(&k, &digest).unwrap();
        let recovered = recover_with_prefix(&sig, &digest, "TEST").unwrap();
        assert_eq!(recovered.prefix(), "TEST");
        assert_eq!(recovered, k.public_key());
    }

    #[test]
    fn test_deterministic_signatures() {
        let k = key("frank");
        let digest = sha256(b"determinism is underrated");
        assert_eq!(
            sign_digest(&k, &digest).unwrap(),
            sign_digest(&k, &digest).unwrap()
        );
    }

    #[test]
    fn test_many_digests_are_all_canonical() {
        // With ~25% of raw signatures non-canonical, 64 digests exercise the
        // retry path many times over.
        let k = key("bob");
        for i in 0u32..64 {
            let digest = sha256(&i.to_le_bytes());
            let sig = sign_digest(&k, &digest).unwrap();
            assert!(sig.is_canonical());
            assert!(verify(&k.public_key(), &digest, &sig));
        }
    }

    #[test]
    fn test_wrong_key_or_digest_fails() {
        let digest = sha256(b"message");
        let sig = sign_digest(&key("alice"), &digest).unwrap();
        assert!(!verify(&key("bob").public_key(), &digest, &sig));
        assert!(!verify(&key("alice").public_key(), &sha256(b"other"), &sig));
    }

    #[test]
    fn test_bad_header_is_rejected() {
        let digest = sha256(b"header");
        let sig = sign_digest(&key("alice"), &digest).unwrap();
        let mut bytes = *sig.as_bytes();
        bytes[0] = 27;
        let bad = CompactSignature::from_bytes(bytes);
        assert_eq!(
            recover(&bad, &digest).unwrap_err(),
            SignatureError::InvalidRecoveryId(27)
        );
        assert!(!verify(&key("alice").public_key(), &digest, &bad));
    }

    #[test]
    fn test_canonical_rule() {
        let mut c = [0x01u8; 64];
        assert!(is_canonical(&c));
        c[0] = 0x80;
        assert!(!is_canonical(&c));
        c[0] = 0x00;
        c[1] = 0x7f;
        assert!(!is_canonical(&c));
        c[1] = 0x80;
        assert!(is_canonical(&c));
        c[32] = 0xff;
        assert!(!is_canonical(&c));
    }

    #[test]
    fn test_hex_and_json_roundtrip() {
        let sig = sign_digest(&key("dave"), &sha256(b"json")).unwrap();
        assert_eq!(CompactSignature::from_hex(&sig.to_hex()).unwrap(), sig);
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(serde_json::from_str::<CompactSignature>(&json).unwrap(), sig);
        assert_eq!(<CompactSignature as Decode>::from_bytes(&sig.to_bytes()).unwrap(), sig);
        assert!(CompactSignature::from_hex("abcd").is_err());
    }
}
