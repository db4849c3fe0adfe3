//! Static variants used by operation payloads.
//!
//! On the wire a static variant is `varint(tag) || payload`. In JSON it is
//! a two-element array, `[tag, payload]`.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use super::time::TimePointSec;
use crate::codec::{encode_varint, CodecError, Decode, Encode, Reader};

/// Splits a `[tag, payload]` JSON pair.
fn split_variant<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<(u64, serde_json::Value), D::Error> {
    <(u64, serde_json::Value)>::deserialize(deserializer)
}

fn payload<T: serde::de::DeserializeOwned, E: serde::de::Error>(value: serde_json::Value) -> Result<T, E> {
    serde_json::from_value(value).map_err(E::custom)
}

fn unknown_tag(offset: usize, tag: u64, type_name: &'static str) -> CodecError {
    CodecError::UnknownTag {
        offset,
        tag,
        type_name,
    }
}

// ---------------------------------------------------------------------------
// Vesting policies
// ---------------------------------------------------------------------------

graphene_object! {
    /// Linear vesting after an optional cliff.
    pub struct LinearVestingPolicy {
        pub begin_timestamp: TimePointSec,
        pub vesting_cliff_seconds: u32,
        pub vesting_duration_seconds: u32,
    }
}

graphene_object! {
    /// Coin-days-destroyed vesting.
    pub struct CddVestingPolicy {
        pub start_claim: TimePointSec,
        pub vesting_seconds: u32,
    }
}

/// How a vesting balance releases its funds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VestingPolicy {
    Linear(LinearVestingPolicy),
    Cdd(CddVestingPolicy),
}

impl Encode for VestingPolicy {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            VestingPolicy::Linear(p) => {
                encode_varint(0, out);
                p.encode(out);
            }
            VestingPolicy::Cdd(p) => {
                encode_varint(1, out);
                p.encode(out);
            }
        }
    }
}

impl Decode for VestingPolicy {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let offset = reader.offset();
        match reader.read_varint()? {
            0 => Ok(VestingPolicy::Linear(Decode::decode(reader)?)),
            1 => Ok(VestingPolicy::Cdd(Decode::decode(reader)?)),
            tag => Err(unknown_tag(offset, tag, "vesting policy")),
        }
    }
}

impl Serialize for VestingPolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VestingPolicy::Linear(p) => (0u8, p).serialize(serializer),
            VestingPolicy::Cdd(p) => (1u8, p).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for VestingPolicy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match split_variant(deserializer)? {
            (0, value) => Ok(VestingPolicy::Linear(payload::<_, D::Error>(value)?)),
            (1, value) => Ok(VestingPolicy::Cdd(payload::<_, D::Error>(value)?)),
            (tag, _) => Err(D::Error::custom(format!("unknown vesting policy tag {tag}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Worker initializers
// ---------------------------------------------------------------------------

/// What a worker does with its daily pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerInitializer {
    /// Pay goes back to the reserve pool.
    Refund,
    /// Pay goes into a vesting balance owned by the worker.
    Vesting { pay_vesting_period_days: u16 },
    /// Pay is sent to the null account.
    Burn,
}

impl Encode for WorkerInitializer {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            WorkerInitializer::Refund => encode_varint(0, out),
            WorkerInitializer::Vesting {
                pay_vesting_period_days,
            } => {
                encode_varint(1, out);
                pay_vesting_period_days.encode(out);
            }
            WorkerInitializer::Burn => encode_varint(2, out),
        }
    }
}

impl Decode for WorkerInitializer {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let offset = reader.offset();
        match reader.read_varint()? {
            0 => Ok(WorkerInitializer::Refund),
            1 => Ok(WorkerInitializer::Vesting {
                pay_vesting_period_days: u16::decode(reader)?,
            }),
            2 => Ok(WorkerInitializer::Burn),
            tag => Err(unknown_tag(offset, tag, "worker initializer")),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct VestingInit {
    pay_vesting_period_days: u16,
}

impl Serialize for WorkerInitializer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let empty = serde_json::Map::new();
        match self {
            WorkerInitializer::Refund => (0u8, &empty).serialize(serializer),
            WorkerInitializer::Vesting {
                pay_vesting_period_days,
            } => (
                1u8,
                VestingInit {
                    pay_vesting_period_days: *pay_vesting_period_days,
                },
            )
                .serialize(serializer),
            WorkerInitializer::Burn => (2u8, &empty).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for WorkerInitializer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match split_variant(deserializer)? {
            (0, _) => Ok(WorkerInitializer::Refund),
            (1, value) => {
                let init: VestingInit = payload::<_, D::Error>(value)?;
                Ok(WorkerInitializer::Vesting {
                    pay_vesting_period_days: init.pay_vesting_period_days,
                })
            }
            (2, _) => Ok(WorkerInitializer::Burn),
            (tag, _) => Err(D::Error::custom(format!("unknown worker initializer tag {tag}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// HTLC preimage hashes
// ---------------------------------------------------------------------------

/// The hash an HTLC's preimage must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtlcHash {
    Ripemd160([u8; 20]),
    Sha1([u8; 20]),
    Sha256([u8; 32]),
    Hash160([u8; 20]),
}

impl HtlcHash {
    fn tag(&self) -> u8 {
        match self {
            HtlcHash::Ripemd160(_) => 0,
            HtlcHash::Sha1(_) => 1,
            HtlcHash::Sha256(_) => 2,
            HtlcHash::Hash160(_) => 3,
        }
    }

    fn digest(&self) -> &[u8] {
        match self {
            HtlcHash::Ripemd160(h) | HtlcHash::Sha1(h) | HtlcHash::Hash160(h) => h,
            HtlcHash::Sha256(h) => h,
        }
    }

    /// Builds the variant for `tag` from raw digest bytes.
    pub fn from_parts(tag: u64, digest: &[u8]) -> Result<Self, String> {
        fn fixed<const N: usize>(digest: &[u8]) -> Result<[u8; N], String> {
            digest
                .try_into()
                .map_err(|_| format!("expected a {N}-byte digest, got {}", digest.len()))
        }
        match tag {
            0 => Ok(HtlcHash::Ripemd160(fixed(digest)?)),
            1 => Ok(HtlcHash::Sha1(fixed(digest)?)),
            2 => Ok(HtlcHash::Sha256(fixed(digest)?)),
            3 => Ok(HtlcHash::Hash160(fixed(digest)?)),
            other => Err(format!("unknown htlc hash tag {other}")),
        }
    }

    /// SHA-256 lock for `preimage`.
    pub fn sha256_of(preimage: &[u8]) -> Self {
        HtlcHash::Sha256(crate::crypto::sha256(preimage))
    }

    /// RIPEMD-160 lock for `preimage`.
    pub fn ripemd160_of(preimage: &[u8]) -> Self {
        HtlcHash::Ripemd160(crate::crypto::ripemd160(preimage))
    }

    /// Bitcoin-style `RIPEMD160(SHA256(preimage))` lock.
    pub fn hash160_of(preimage: &[u8]) -> Self {
        HtlcHash::Hash160(crate::crypto::hash::hash160(preimage))
    }
}

impl Encode for HtlcHash {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_varint(u64::from(self.tag()), out);
        // Fixed-size fc hashes pack as raw bytes, no length prefix.
        out.extend_from_slice(self.digest());
    }
}

impl Decode for HtlcHash {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let offset = reader.offset();
        let tag = reader.read_varint()?;
        let len = match tag {
            0 | 1 | 3 => 20,
            2 => 32,
            other => return Err(unknown_tag(offset, other, "htlc hash")),
        };
        let digest = reader.take(len)?;
        Self::from_parts(tag, digest).map_err(|e| Reader::invalid(offset, "htlc hash", e))
    }
}

impl Serialize for HtlcHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.tag(), hex::encode(self.digest())).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HtlcHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (tag, digest) = <(u64, String)>::deserialize(deserializer)?;
        let bytes = hex::decode(&digest).map_err(D::Error::custom)?;
        Self::from_parts(tag, &bytes).map_err(D::Error::custom)
    }
}
