//! # Key Management
//!
//! secp256k1 keys in the three shapes a Graphene chain knows them:
//!
//! - [`PrivateKey`]: a scalar, exchanged as WIF (`5K...`), never serialized
//!   any other way.
//! - [`PublicKey`]: a compressed point, printed as `PREFIX + base58(point ||
//!   ripemd160(point)[..4])`, e.g. `BTS6MRy...`.
//! - [`Address`]: `RIPEMD160(SHA512(point))`, printed like a key but with
//!   the checksum taken over the 20 address bytes. Authorities sort their
//!   keys by this value, which is the only reason most callers ever see one.
//!
//! ## The prefix is not part of the key
//!
//! `BTS6MRy...` and `TEST6MRy...` are the same point. The prefix is carried
//! along for display, but equality, ordering and hashing only look at the
//! 33 compressed bytes. Otherwise a key read off a testnet node would fail
//! to match the same key in a key store that was filled from mainnet strings.
//!
//! ## Security considerations
//!
//! - Key generation uses the OS RNG through `secp256k1`'s `rand-std` feature.
//! - `Debug` for [`PrivateKey`] prints the public key only. If you add
//!   logging to this module, you will be asked to leave.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use secp256k1::{SecretKey, SECP256K1};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use super::hash::{double_sha256, ripemd160, sha256, sha512};
use crate::codec::{CodecError, Decode, Encode, Reader};
use crate::config::{
    ADDRESS_LENGTH, CHECKSUM_LENGTH, DEFAULT_ADDRESS_PREFIX, KNOWN_ADDRESS_PREFIXES,
    PUBLIC_KEY_LENGTH, WIF_VERSION,
};

/// Errors that can occur during key operations.
///
/// Messages never include key material. A WIF that fails its checksum is
/// reported as such, without echoing the string back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret key: not a valid secp256k1 scalar")]
    InvalidSecretKey,

    #[error("invalid public key: not a valid compressed secp256k1 point")]
    InvalidPublicKey,

    #[error("invalid WIF: {0}")]
    InvalidWif(&'static str),

    #[error("base58 decoding failed")]
    Base58,

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("unknown address prefix in '{0}'")]
    UnknownPrefix(String),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// A secp256k1 private key.
///
/// Intentionally does NOT implement `Serialize`. Exporting a private key
/// should be a deliberate `to_wif()` call, not a side effect of shoving a
/// struct into a JSON response.
#[derive(Clone)]
pub struct PrivateKey {
    secret: SecretKey,
}

impl PrivateKey {
    /// Generates a fresh key from the OS RNG.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            secret: SecretKey::new(&mut rng),
        }
    }

    /// Wraps raw scalar bytes. Fails for zero or values above the curve order.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        SecretKey::from_slice(bytes)
            .map(|secret| Self { secret })
            .map_err(|_| KeyError::InvalidSecretKey)
    }

    /// Derives a key as `SHA256(seed)`.
    ///
    /// This is how Graphene turns brain keys and `account + role + password`
    /// strings into keys. A weak seed gives you a weak key; the hash does not
    /// add entropy.
    pub fn from_seed(seed: &str) -> Result<Self, KeyError> {
        let digest = Zeroizing::new(sha256(seed.as_bytes()));
        Self::from_bytes(&digest)
    }

    /// The password-derived key for `role` ("owner", "active", "memo") of
    /// `account`, as the reference wallet derives them.
    pub fn from_account_password(account: &str, role: &str, password: &str) -> Result<Self, KeyError> {
        let seed = Zeroizing::new(format!("{account}{role}{password}"));
        Self::from_seed(&seed)
    }

    /// Parses a Wallet Import Format string.
    ///
    /// Layout: `base58(0x80 || key || double_sha256(0x80 || key)[..4])`.
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let raw = Zeroizing::new(bs58::decode(wif).into_vec().map_err(|_| KeyError::Base58)?);
        if raw.len() != 1 + 32 + CHECKSUM_LENGTH {
            return Err(KeyError::InvalidWif("wrong length"));
        }
        if raw[0] != WIF_VERSION {
            return Err(KeyError::InvalidWif("wrong version byte"));
        }
        let (payload, checksum) = raw.split_at(1 + 32);
        if double_sha256(payload)[..CHECKSUM_LENGTH] != *checksum {
            return Err(KeyError::ChecksumMismatch);
        }
        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(&payload[1..]);
        Self::from_bytes(&bytes)
    }

    /// Exports the key as WIF. Handle with the care the name implies.
    pub fn to_wif(&self) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(1 + 32 + CHECKSUM_LENGTH));
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.secret.secret_bytes());
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
        bs58::encode(payload.as_slice()).into_string()
    }

    /// Raw scalar bytes, wrapped so they are wiped when dropped.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.secret_bytes())
    }

    /// The matching public key, tagged with the default prefix.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secp(self.secret.public_key(SECP256K1), DEFAULT_ADDRESS_PREFIX)
    }

    /// ECDH shared secret with `other`: the 32-byte x-coordinate of
    /// `self * other`. Symmetric: `a.shared_secret(B) == b.shared_secret(A)`.
    pub fn shared_secret(&self, other: &PublicKey) -> Zeroizing<[u8; 32]> {
        let point = Zeroizing::new(secp256k1::ecdh::shared_secret_point(
            &other.key,
            &self.secret,
        ));
        let mut x = Zeroizing::new([0u8; 32]);
        x.copy_from_slice(&point[..32]);
        x
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material. Not even "partially."
        write!(f, "PrivateKey(pub={})", self.public_key())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for PrivateKey {}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wif(s)
    }
}

// ---------------------------------------------------------------------------
// Prefix handling
// ---------------------------------------------------------------------------

/// Splits a known prefix off `s`.
fn split_known_prefix(s: &str) -> Result<(&'static str, &str), KeyError> {
    KNOWN_ADDRESS_PREFIXES
        .iter()
        .find_map(|p| s.strip_prefix(p).map(|rest| (*p, rest)))
        .ok_or_else(|| KeyError::UnknownPrefix(s.chars().take(8).collect()))
}

/// Decodes `base58(payload || ripemd160(payload)[..4])` and checks the tail.
fn decode_checked(body: &str, payload_len: usize) -> Result<Vec<u8>, KeyError> {
    let raw = bs58::decode(body).into_vec().map_err(|_| KeyError::Base58)?;
    if raw.len() != payload_len + CHECKSUM_LENGTH {
        return Err(KeyError::InvalidLength {
            expected: payload_len + CHECKSUM_LENGTH,
            actual: raw.len(),
        });
    }
    let (payload, checksum) = raw.split_at(payload_len);
    if ripemd160(payload)[..CHECKSUM_LENGTH] != *checksum {
        return Err(KeyError::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}

fn encode_checked(prefix: &str, payload: &[u8]) -> String {
    let mut raw = payload.to_vec();
    raw.extend_from_slice(&ripemd160(payload)[..CHECKSUM_LENGTH]);
    format!("{prefix}{}", bs58::encode(raw).into_string())
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A compressed secp256k1 public key plus the chain prefix it prints with.
#[derive(Clone)]
pub struct PublicKey {
    key: secp256k1::PublicKey,
    prefix: String,
}

impl PublicKey {
    pub(crate) fn from_secp(key: secp256k1::PublicKey, prefix: &str) -> Self {
        Self {
            key,
            prefix: prefix.to_string(),
        }
    }

    /// Parses 33 compressed bytes.
    pub fn from_bytes(bytes: &[u8], prefix: &str) -> Result<Self, KeyError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        let key = secp256k1::PublicKey::from_slice(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self::from_secp(key, prefix))
    }

    /// Parses a key string that must carry exactly `prefix`.
    pub fn from_str_with_prefix(s: &str, prefix: &str) -> Result<Self, KeyError> {
        let body = s
            .strip_prefix(prefix)
            .ok_or_else(|| KeyError::UnknownPrefix(s.chars().take(8).collect()))?;
        let payload = decode_checked(body, PUBLIC_KEY_LENGTH)?;
        Self::from_bytes(&payload, prefix)
    }

    /// The same key, printed with another prefix.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self::from_secp(self.key, prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The 33-byte compressed point.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.key.serialize()
    }

    /// Hex of the compressed point, handy in logs and test fixtures.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The Graphene address of this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    pub(crate) fn secp(&self) -> &secp256k1::PublicKey {
        &self.key
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_checked(&self.prefix, &self.to_bytes()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    /// Accepts any of the known chain prefixes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, _) = split_known_prefix(s)?;
        Self::from_str_with_prefix(s, prefix)
    }
}

impl Encode for PublicKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }
}

impl Decode for PublicKey {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let offset = reader.offset();
        let bytes: [u8; PUBLIC_KEY_LENGTH] = reader.take_array()?;
        Self::from_bytes(&bytes, reader.prefix())
            .map_err(|e| Reader::invalid(offset, "public key", e.to_string()))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// `RIPEMD160(SHA512(compressed_key))`, with the prefix it prints with.
#[derive(Clone)]
pub struct Address {
    bytes: [u8; ADDRESS_LENGTH],
    prefix: String,
}

impl Address {
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self {
            bytes: ripemd160(&sha512(&key.to_bytes())),
            prefix: key.prefix.clone(),
        }
    }

    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH], prefix: &str) -> Self {
        Self {
            bytes,
            prefix: prefix.to_string(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.bytes
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_checked(&self.prefix, &self.bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, body) = split_known_prefix(s)?;
        let payload = decode_checked(body, ADDRESS_LENGTH)?;
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&payload);
        Ok(Self::from_bytes(bytes, prefix))
    }
}

impl Encode for Address {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bytes);
    }
}

impl Decode for Address {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let bytes = reader.take_array()?;
        Ok(Self::from_bytes(bytes, reader.prefix()))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
