//! # Weighted-Threshold Authorities
//!
//! An authority says "these keys and these accounts, with these weights,
//! must together reach this threshold". Every account has two of them:
//! `owner` (can do anything, including replacing the other) and `active`
//! (day-to-day operations).
//!
//! ## The sort is load-bearing
//!
//! On the wire `key_auths` is a `flat_map<public_key, weight>`, and the node
//! orders public keys by their *address* (`RIPEMD160(SHA512(key))`), not by
//! the raw point bytes. Two authorities with the same content must encode to
//! the same bytes whatever order the caller listed the keys in, so the
//! encoder sorts: accounts by instance, keys by address, addresses by bytes.
//! The in-memory order is left alone.
//!
//! ## Unreachable thresholds
//!
//! An authority whose threshold exceeds the sum of its weights is valid on
//! chain and permanently unusable. Reading one from the node is fine; code
//! that *creates* one goes through [`Authority::new`] or
//! [`Authority::validate`], which reject it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::object_id::AccountId;
use crate::codec::{encode_varint, CodecError, Decode, Encode, Reader};
use crate::crypto::{Address, PublicKey};

/// Signature weight of one key or account inside an authority.
pub type Weight = u16;

/// Authority construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("weight threshold {threshold} exceeds the total available weight {total}")]
    ThresholdUnreachable { threshold: u32, total: u64 },
}

/// Which of an account's two authorities to act under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Owner,
    Active,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Permission::Owner => "owner",
            Permission::Active => "active",
        })
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Permission::Owner),
            "active" => Ok(Permission::Active),
            other => Err(format!("unknown permission '{other}'")),
        }
    }
}

/// A weighted set of keys and accounts plus a threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    pub account_auths: Vec<(AccountId, Weight)>,
    pub key_auths: Vec<(PublicKey, Weight)>,
    #[serde(default)]
    pub address_auths: Vec<(Address, Weight)>,
}

impl Authority {
    /// Builds an authority and checks that its threshold is reachable.
    pub fn new(
        weight_threshold: u32,
        account_auths: Vec<(AccountId, Weight)>,
        key_auths: Vec<(PublicKey, Weight)>,
    ) -> Result<Self, AuthorityError> {
        let authority = Self {
            weight_threshold,
            account_auths,
            key_auths,
            address_auths: Vec::new(),
        };
        authority.validate()?;
        Ok(authority)
    }

    /// The usual single-key authority: threshold 1, one key of weight 1.
    pub fn single_key(key: PublicKey) -> Self {
        Self {
            weight_threshold: 1,
            account_auths: Vec::new(),
            key_auths: vec![(key, 1)],
            address_auths: Vec::new(),
        }
    }

    /// Sum of every listed weight.
    pub fn total_weight(&self) -> u64 {
        let accounts = self.account_auths.iter().map(|(_, w)| u64::from(*w));
        let keys = self.key_auths.iter().map(|(_, w)| u64::from(*w));
        let addresses = self.address_auths.iter().map(|(_, w)| u64::from(*w));
        accounts.chain(keys).chain(addresses).sum()
    }

    /// Rejects an authority that could never be satisfied.
    pub fn validate(&self) -> Result<(), AuthorityError> {
        let total = self.total_weight();
        if u64::from(self.weight_threshold) > total {
            return Err(AuthorityError::ThresholdUnreachable {
                threshold: self.weight_threshold,
                total,
            });
        }
        Ok(())
    }

    /// Weight listed for `key`, if any.
    pub fn key_weight(&self, key: &PublicKey) -> Option<Weight> {
        self.key_auths.iter().find(|(k, _)| k == key).map(|(_, w)| *w)
    }

    fn sorted_accounts(&self) -> Vec<&(AccountId, Weight)> {
        let mut sorted: Vec<_> = self.account_auths.iter().collect();
        sorted.sort_by_key(|(id, _)| *id);
        sorted
    }

    fn sorted_keys(&self) -> Vec<(Address, &(PublicKey, Weight))> {
        let mut sorted: Vec<_> = self
            .key_auths
            .iter()
            .map(|entry| (entry.0.address(), entry))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
    }

    fn sorted_addresses(&self) -> Vec<&(Address, Weight)> {
        let mut sorted: Vec<_> = self.address_auths.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
    }
}

// Equality is semantic: the same entries in any order are the same
// authority, exactly as they encode to the same bytes.
impl PartialEq for Authority {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Authority {}

impl Encode for Authority {
    fn encode(&self, out: &mut Vec<u8>) {
        self.weight_threshold.encode(out);

        let accounts = self.sorted_accounts();
        encode_varint(accounts.len() as u64, out);
        for entry in accounts {
            entry.encode(out);
        }

        let keys = self.sorted_keys();
        encode_varint(keys.len() as u64, out);
        for (_, entry) in keys {
            entry.encode(out);
        }

        let addresses = self.sorted_addresses();
        encode_varint(addresses.len() as u64, out);
        for entry in addresses {
            entry.encode(out);
        }
    }
}

impl Decode for Authority {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            weight_threshold: u32::decode(reader)?,
            account_auths: Vec::decode(reader)?,
            key_auths: Vec::decode(reader)?,
            address_auths: Vec::decode(reader)?,
        })
    }
}
