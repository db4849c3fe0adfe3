//! # Typed Object Model
//!
//! Every protocol object the client builds or reads, as a plain Rust struct
//! with its canonical field order declared exactly once.
//!
//! ## Architecture
//!
//! ```text
//! object_id.rs     `space.type.instance` ids and their typed newtypes
//! time.rs          time_point_sec
//! amount.rs        AssetAmount, Price, PriceFeed
//! authority.rs     weighted-threshold authorities and permissions
//! account.rs       AccountOptions, VoteId, the node's account object
//! asset.rs         AssetOptions, BitAssetOptions, permission flags
//! extensions.rs    empty and populated extension bags
//! variants.rs      vesting policies, worker initializers, HTLC hashes
//! cached.rs        explicit "fetched / not fetched" holder
//! ```
//!
//! ## Two encodings, one shape
//!
//! Each type has a binary form (the bytes that get hashed and signed) and a
//! JSON form (what the node's API speaks). Both follow the node's own
//! conventions: ids and keys as strings, times without a zone, 64-bit
//! integers accepted either as numbers or as strings.

pub mod account;
pub mod amount;
pub mod asset;
pub mod authority;
pub mod cached;
pub mod extensions;
pub mod object_id;
pub mod serde_helpers;
pub mod time;
pub mod variants;

pub use account::{Account, AccountOptions, VoteId, VoteType};
pub use amount::{AssetAmount, Price, PriceFeed};
pub use asset::{asset_flags, AssetOptions, BitAssetOptions};
pub use authority::{Authority, AuthorityError, Permission, Weight};
pub use cached::Cached;
pub use extensions::{AssetOptionsExtensions, CallOrderExtensions, Extensions};
pub use object_id::{
    AccountId, AssetId, BalanceId, CommitteeMemberId, HtlcId, LimitOrderId, ObjectId,
    ObjectIdError, ProposalId, VestingBalanceId, WithdrawPermissionId, WitnessId, WorkerId,
};
pub use serde_helpers::int_or_string;
pub use time::TimePointSec;
pub use variants::{CddVestingPolicy, HtlcHash, LinearVestingPolicy, VestingPolicy, WorkerInitializer};
