//! # Operation Catalog
//!
//! The typed tagged union of everything a transaction can carry.
//!
//! ## Architecture
//!
//! ```text
//! registry.rs  the full id <-> name table, virtual operations included
//! catalog.rs   payload structs of the constructible operations
//! validate.rs  local shape checks and set normalization
//! ```
//!
//! ## Wire and JSON forms
//!
//! On the wire an operation is `varint(id) || payload`. In JSON it is
//! `[id, {payload}]`. Both directions are generated from the single table in
//! the `operations!` invocation below, so the id, name, payload type and
//! decoder of a variant cannot drift apart.
//!
//! ## Building from JSON
//!
//! [`Operation::from_json`] builds a payload from loose JSON. `fee` and
//! `extensions` default to empty; any other missing field fails with
//! [`OperationError::MissingField`], naming both the operation and the field.

pub mod catalog;
pub mod registry;
pub mod validate;

pub use catalog::*;
pub use registry::{operation_id_for_name, operation_name_for_id, OPERATION_NAMES};

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{encode_varint, CodecError, Decode, Encode, Reader};
use crate::types::{AssetAmount, AuthorityError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building or checking an operation locally.
///
/// None of these are worth retrying: the caller supplied an incomplete or
/// unrecognized operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("operation '{operation}' is missing required field '{field}'")]
    MissingField {
        operation: &'static str,
        field: String,
    },

    /// Unknown to the protocol, or known but not constructible here
    /// (virtual and blinded operations).
    #[error("unknown or unsupported operation '{0}'")]
    UnknownOperation(String),

    #[error("malformed field in '{operation}': {reason}")]
    InvalidField {
        operation: &'static str,
        reason: String,
    },

    #[error("invalid {operation} operation: {reason}")]
    Invalid {
        operation: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Authority(#[from] AuthorityError),
}

/// Maps a serde failure on an operation payload to the error taxonomy.
fn payload_error(operation: &'static str, err: serde_json::Error) -> OperationError {
    let message = err.to_string();
    if let Some(field) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        return OperationError::MissingField {
            operation,
            field: field.to_string(),
        };
    }
    OperationError::InvalidField {
        operation,
        reason: message,
    }
}

// ---------------------------------------------------------------------------
// The table
// ---------------------------------------------------------------------------

macro_rules! operations {
    ($( $id:literal => $variant:ident ( $name:literal ) ),+ $(,)?) => {
        /// A single operation, tagged with its protocol id.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Operation {
            $( $variant($variant), )+
        }

        /// Ids of every operation this crate can build, ascending.
        pub const CONSTRUCTIBLE_OPERATIONS: &[u16] = &[$( $id ),+];

        impl Operation {
            /// Protocol id: the static-variant tag.
            pub fn id(&self) -> u16 {
                match self {
                    $( Operation::$variant(_) => $id, )+
                }
            }

            /// Protocol name, as in `get_required_fees` errors and the
            /// node's JSON.
            pub fn name(&self) -> &'static str {
                match self {
                    $( Operation::$variant(_) => $name, )+
                }
            }

            pub fn fee(&self) -> &AssetAmount {
                match self {
                    $( Operation::$variant(op) => &op.fee, )+
                }
            }

            pub fn fee_mut(&mut self) -> &mut AssetAmount {
                match self {
                    $( Operation::$variant(op) => &mut op.fee, )+
                }
            }

            /// Builds operation `id` from its JSON payload.
            pub fn from_json_id(id: u16, payload: serde_json::Value) -> Result<Self, OperationError> {
                match id {
                    $(
                        $id => serde_json::from_value::<$variant>(payload)
                            .map(Operation::$variant)
                            .map_err(|e| payload_error($name, e)),
                    )+
                    other => Err(OperationError::UnknownOperation(
                        operation_name_for_id(other)
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("#{other}")),
                    )),
                }
            }
        }

        impl Encode for Operation {
            fn encode(&self, out: &mut Vec<u8>) {
                encode_varint(u64::from(self.id()), out);
                match self {
                    $( Operation::$variant(op) => op.encode(out), )+
                }
            }
        }

        impl Decode for Operation {
            fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
                let offset = reader.offset();
                match reader.read_varint()? {
                    $( $id => Ok(Operation::$variant(Decode::decode(reader)?)), )+
                    tag => Err(CodecError::UnknownTag {
                        offset,
                        tag,
                        type_name: "operation",
                    }),
                }
            }
        }

        impl Serialize for Operation {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $( Operation::$variant(op) => (self.id(), op).serialize(serializer), )+
                }
            }
        }

        $(
            impl From<$variant> for Operation {
                fn from(op: $variant) -> Self {
                    Operation::$variant(op)
                }
            }
        )+
    };
}

operations! {
    0 => Transfer("transfer"),
    1 => LimitOrderCreate("limit_order_create"),
    2 => LimitOrderCancel("limit_order_cancel"),
    3 => CallOrderUpdate("call_order_update"),
    5 => AccountCreate("account_create"),
    6 => AccountUpdate("account_update"),
    7 => AccountWhitelist("account_whitelist"),
    8 => AccountUpgrade("account_upgrade"),
    9 => AccountTransfer("account_transfer"),
    10 => AssetCreate("asset_create"),
    11 => AssetUpdate("asset_update"),
    12 => AssetUpdateBitasset("asset_update_bitasset"),
    13 => AssetUpdateFeedProducers("asset_update_feed_producers"),
    14 => AssetIssue("asset_issue"),
    15 => AssetReserve("asset_reserve"),
    16 => AssetFundFeePool("asset_fund_fee_pool"),
    17 => AssetSettle("asset_settle"),
    18 => AssetGlobalSettle("asset_global_settle"),
    19 => AssetPublishFeed("asset_publish_feed"),
    20 => WitnessCreate("witness_create"),
    21 => WitnessUpdate("witness_update"),
    22 => ProposalCreate("proposal_create"),
    23 => ProposalUpdate("proposal_update"),
    24 => ProposalDelete("proposal_delete"),
    25 => WithdrawPermissionCreate("withdraw_permission_create"),
    29 => CommitteeMemberCreate("committee_member_create"),
    30 => CommitteeMemberUpdate("committee_member_update"),
    32 => VestingBalanceCreate("vesting_balance_create"),
    33 => VestingBalanceWithdraw("vesting_balance_withdraw"),
    34 => WorkerCreate("worker_create"),
    35 => Custom("custom"),
    37 => BalanceClaim("balance_claim"),
    38 => OverrideTransfer("override_transfer"),
    43 => AssetClaimFees("asset_claim_fees"),
    45 => BidCollateral("bid_collateral"),
    47 => AssetClaimPool("asset_claim_pool"),
    48 => AssetUpdateIssuer("asset_update_issuer"),
    49 => HtlcCreate("htlc_create"),
    50 => HtlcRedeem("htlc_redeem"),
    52 => HtlcExtend("htlc_extend"),
}

impl Operation {
    /// Builds the operation called `name` from its JSON payload.
    pub fn from_json(name: &str, payload: serde_json::Value) -> Result<Self, OperationError> {
        let id = operation_id_for_name(name)
            .ok_or_else(|| OperationError::UnknownOperation(name.to_string()))?;
        Self::from_json_id(id, payload)
    }

    /// Whether operation `id` can be built by this crate.
    pub fn is_constructible(id: u16) -> bool {
        CONSTRUCTIBLE_OPERATIONS.binary_search(&id).is_ok()
    }

    /// The wrapped operations, if this is a `proposal_create`.
    pub fn proposed_ops(&self) -> Option<&[OpWrapper]> {
        match self {
            Operation::ProposalCreate(p) => Some(&p.proposed_ops),
            _ => None,
        }
    }

    pub fn proposed_ops_mut(&mut self) -> Option<&mut Vec<OpWrapper>> {
        match self {
            Operation::ProposalCreate(p) => Some(&mut p.proposed_ops),
            _ => None,
        }
    }
}

// Accepts the tag as an id or, for hand-written JSON, as a name.
impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (tag, payload) = <(serde_json::Value, serde_json::Value)>::deserialize(deserializer)?;
        let id = match &tag {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| D::Error::custom(format!("invalid operation id {n}")))?,
            serde_json::Value::String(name) => operation_id_for_name(name)
                .ok_or_else(|| D::Error::custom(format!("unknown operation '{name}'")))?,
            other => return Err(D::Error::custom(format!("invalid operation tag {other}"))),
        };
        Operation::from_json_id(id, payload).map_err(D::Error::custom)
    }
}
