//! Object identifiers: `space.type.instance`.
//!
//! Operations never carry a bare [`ObjectId`]. Each field is typed
//! ([`AccountId`], [`AssetId`], ...) and the wire form is just the varint of
//! the instance, because the type is implied by the field. Parsing a typed id
//! from text checks the space and type and refuses to coerce: `"1.3.0"` is
//! not an account, no matter how politely you ask.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{encode_varint, CodecError, Decode, Encode, Reader};

/// Errors from parsing or converting object ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectIdError {
    #[error("malformed object id '{0}', expected space.type.instance")]
    Malformed(String),

    #[error("object id {found} is not a {kind} (expected {space}.{type_id}.x)")]
    WrongType {
        found: String,
        kind: &'static str,
        space: u8,
        type_id: u8,
    },
}

/// An untyped object id, as printed by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub space: u8,
    pub type_id: u8,
    pub instance: u64,
}

impl ObjectId {
    pub const fn new(space: u8, type_id: u8, instance: u64) -> Self {
        Self {
            space,
            type_id,
            instance,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.type_id, self.instance)
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ObjectIdError::Malformed(s.to_string());
        let mut parts = s.split('.');
        let (Some(space), Some(type_id), Some(instance), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        Ok(Self {
            space: space.parse().map_err(|_| malformed())?,
            type_id: type_id.parse().map_err(|_| malformed())?,
            instance: instance.parse().map_err(|_| malformed())?,
        })
    }
}

impl Serialize for ObjectId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Declares a typed id bound to one `space.type`.
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $space:literal, $type_id:literal, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u64);

        impl $name {
            pub const SPACE: u8 = $space;
            pub const TYPE_ID: u8 = $type_id;

            pub const fn new(instance: u64) -> Self {
                Self(instance)
            }

            pub const fn instance(&self) -> u64 {
                self.0
            }

            pub const fn object_id(&self) -> ObjectId {
                ObjectId::new($space, $type_id, self.0)
            }
        }

        impl TryFrom<ObjectId> for $name {
            type Error = ObjectIdError;

            fn try_from(id: ObjectId) -> Result<Self, Self::Error> {
                if id.space != $space || id.type_id != $type_id {
                    return Err(ObjectIdError::WrongType {
                        found: id.to_string(),
                        kind: $kind,
                        space: $space,
                        type_id: $type_id,
                    });
                }
                Ok(Self(id.instance))
            }
        }

        impl From<$name> for ObjectId {
            fn from(id: $name) -> Self {
                id.object_id()
            }
        }

        impl FromStr for $name {
            type Err = ObjectIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<ObjectId>()?.try_into()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", $space, $type_id, self.0)
            }
        }

        impl Encode for $name {
            fn encode(&self, out: &mut Vec<u8>) {
                encode_varint(self.0, out);
            }
        }

        impl Decode for $name {
            fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
                Ok(Self(reader.read_varint()?))
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

typed_id!(
    /// `1.2.x`
    AccountId, 1, 2, "account"
);
typed_id!(
    /// `1.3.x`
    AssetId, 1, 3, "asset"
);
typed_id!(CommitteeMemberId, 1, 5, "committee member");
typed_id!(WitnessId, 1, 6, "witness");
typed_id!(LimitOrderId, 1, 7, "limit order");
typed_id!(ProposalId, 1, 10, "proposal");
typed_id!(WithdrawPermissionId, 1, 12, "withdraw permission");
typed_id!(VestingBalanceId, 1, 13, "vesting balance");
typed_id!(WorkerId, 1, 14, "worker");
typed_id!(BalanceId, 1, 15, "balance");
typed_id!(HtlcId, 1, 16, "htlc");

impl AssetId {
    /// The core asset, `1.3.0`.
    pub const CORE: AssetId = AssetId(0);
}
