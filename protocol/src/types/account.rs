//! Account options, votes, and the account object as the node returns it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::authority::{Authority, Permission};
use super::extensions::Extensions;
use super::object_id::AccountId;
use crate::codec::{encode_varint, CodecError, Decode, Encode, Reader};
use crate::crypto::PublicKey;

/// What a vote is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum VoteType {
    Committee = 0,
    Witness = 1,
    Worker = 2,
}

impl VoteType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(VoteType::Committee),
            1 => Some(VoteType::Witness),
            2 => Some(VoteType::Worker),
            _ => None,
        }
    }
}

/// A vote, printed as `"type:instance"` (`"1:27"` is a witness vote).
///
/// Packed into a `u32` on the wire: type in the low 8 bits, instance in the
/// high 24. Ordering compares the packed value, which puts the numeric
/// suffix first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteId {
    pub vote_type: VoteType,
    pub instance: u32,
}

/// Largest instance that fits in the 24 high bits.
pub const MAX_VOTE_INSTANCE: u32 = (1 << 24) - 1;

impl VoteId {
    pub fn new(vote_type: VoteType, instance: u32) -> Result<Self, String> {
        if instance > MAX_VOTE_INSTANCE {
            return Err(format!("vote instance {instance} does not fit in 24 bits"));
        }
        Ok(Self {
            vote_type,
            instance,
        })
    }

    pub fn packed(&self) -> u32 {
        (self.vote_type as u32) | (self.instance << 8)
    }

    pub fn from_packed(value: u32) -> Result<Self, String> {
        let vote_type = VoteType::from_u8((value & 0xff) as u8)
            .ok_or_else(|| format!("unknown vote type {}", value & 0xff))?;
        Ok(Self {
            vote_type,
            instance: value >> 8,
        })
    }
}

impl PartialOrd for VoteId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VoteId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.packed().cmp(&other.packed())
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vote_type as u8, self.instance)
    }
}

impl FromStr for VoteId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (t, i) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed vote id '{s}'"))?;
        let vote_type = t
            .parse::<u8>()
            .ok()
            .and_then(VoteType::from_u8)
            .ok_or_else(|| format!("unknown vote type in '{s}'"))?;
        let instance = i
            .parse::<u32>()
            .map_err(|_| format!("malformed vote instance in '{s}'"))?;
        Self::new(vote_type, instance)
    }
}

impl Encode for VoteId {
    fn encode(&self, out: &mut Vec<u8>) {
        self.packed().encode(out);
    }
}

impl Decode for VoteId {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let offset = reader.offset();
        let packed = u32::decode(reader)?;
        Self::from_packed(packed).map_err(|e| Reader::invalid(offset, "vote id", e))
    }
}

impl Serialize for VoteId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VoteId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The voting and memo settings of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOptions {
    pub memo_key: PublicKey,
    pub voting_account: AccountId,
    pub num_witness: u16,
    pub num_committee: u16,
    pub votes: Vec<VoteId>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl AccountOptions {
    /// Options for a fresh account: no votes, proxy to self.
    pub fn new(memo_key: PublicKey) -> Self {
        Self {
            memo_key,
            voting_account: AccountId(5),
            num_witness: 0,
            num_committee: 0,
            votes: Vec::new(),
            extensions: Extensions::default(),
        }
    }

    /// Votes deduplicated and in wire order.
    pub fn canonical_votes(&self) -> Vec<VoteId> {
        let mut votes = self.votes.clone();
        votes.sort();
        votes.dedup();
        votes
    }

    /// Checks that the desired witness and committee counts are backed by
    /// at least that many votes of the matching kind.
    pub fn validate(&self) -> Result<(), String> {
        let votes = self.canonical_votes();
        let count = |t: VoteType| votes.iter().filter(|v| v.vote_type == t).count();
        if usize::from(self.num_witness) > count(VoteType::Witness) {
            return Err(format!(
                "num_witness {} exceeds the {} witness votes cast",
                self.num_witness,
                count(VoteType::Witness)
            ));
        }
        if usize::from(self.num_committee) > count(VoteType::Committee) {
            return Err(format!(
                "num_committee {} exceeds the {} committee votes cast",
                self.num_committee,
                count(VoteType::Committee)
            ));
        }
        Ok(())
    }
}

impl Encode for AccountOptions {
    fn encode(&self, out: &mut Vec<u8>) {
        self.memo_key.encode(out);
        self.voting_account.encode(out);
        self.num_witness.encode(out);
        self.num_committee.encode(out);
        let votes = self.canonical_votes();
        encode_varint(votes.len() as u64, out);
        for vote in &votes {
            vote.encode(out);
        }
        self.extensions.encode(out);
    }
}

impl Decode for AccountOptions {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            memo_key: PublicKey::decode(reader)?,
            voting_account: AccountId::decode(reader)?,
            num_witness: u16::decode(reader)?,
            num_committee: u16::decode(reader)?,
            votes: Vec::decode(reader)?,
            extensions: Extensions::decode(reader)?,
        })
    }
}

/// The subset of `account_object` the client needs.
///
/// The node sends many more fields (statistics, membership expiry,
/// referrer bookkeeping); serde ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub options: AccountOptions,
}

impl Account {
    pub fn authority(&self, permission: Permission) -> &Authority {
        match permission {
            Permission::Owner => &self.owner,
            Permission::Active => &self.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    fn memo_key() -> PublicKey {
        PrivateKey::from_seed("alice").unwrap().public_key()
    }

    #[test]
    fn test_vote_id_packing() {
        let v: VoteId = "1:27".parse().unwrap();
        assert_eq!(v.vote_type, VoteType::Witness);
        assert_eq!(v.packed(), 1 | (27 << 8));
        assert_eq!(v.to_string(), "1:27");
        assert_eq!(VoteId::from_bytes(&v.to_bytes()).unwrap(), v);
    }

    #[test]
    fn test_vote_id_rejects_garbage() {
        assert!("9:1".parse::<VoteId>().is_err());
        assert!("1-1".parse::<VoteId>().is_err());
        assert!("0:16777216".parse::<VoteId>().is_err());
        assert!(VoteId::from_bytes(&7u32.to_le_bytes()).is_err());
    }

    #[test]
    fn test_votes_sorted_by_suffix_and_deduplicated() {
        let mut options = AccountOptions::new(memo_key());
        options.votes = ["2:300", "1:27", "0:11", "1:27", "1:5"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let canonical: Vec<String> = options.canonical_votes().iter().map(|v| v.to_string()).collect();
        assert_eq!(canonical, vec!["1:5", "0:11", "1:27", "2:300"]);

        let decoded = AccountOptions::from_bytes(&options.to_bytes()).unwrap();
        assert_eq!(decoded.votes.len(), 4);
    }

    #[test]
    fn test_vote_counts_must_be_backed() {
        let mut options = AccountOptions::new(memo_key());
        options.num_witness = 1;
        assert!(options.validate().is_err());
        options.votes.push("1:27".parse().unwrap());
        assert!(options.validate().is_ok());
        options.num_committee = 1;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_account_json_ignores_extra_fields() {
        let key = memo_key().to_string();
        let json = serde_json::json!({
            "id": "1.2.100",
            "name": "alice",
            "membership_expiration_date": "1970-01-01T00:00:00",
            "owner": {"weight_threshold": 1, "account_auths": [], "key_auths": [[key, 1]], "address_auths": []},
            "active": {"weight_threshold": 1, "account_auths": [], "key_auths": [[key, 1]], "address_auths": []},
            "options": {
                "memo_key": key,
                "voting_account": "1.2.5",
                "num_witness": 0,
                "num_committee": 0,
                "votes": [],
                "extensions": []
            },
            "statistics": "2.6.100"
        });
        let account: Account = serde_json::from_value(json).unwrap();
        assert_eq!(account.id, AccountId(100));
        assert_eq!(account.authority(Permission::Active).weight_threshold, 1);
    }
}
